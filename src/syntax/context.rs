//! Grammar rule nodes
//!
//! Contexts live in the arena of a [`ContextGraph`](super::graph::ContextGraph)
//! and point at each other through [`ContextRef`] handles, so a rule can
//! include itself directly or through any number of other rules.

use super::pattern::{GroupRef, Pattern};

/// Index of a context in its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub(crate) usize);

impl ContextId {
    /// Position in the graph arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a style in its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(pub(crate) usize);

impl StyleId {
    /// Position in the graph arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// Behaviour flags of a rule
///
/// Keyword and simple rules only read the first four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextFlags {
    /// Match at most once per enclosing container scan
    pub once_only: bool,
    /// Only match in the first block of the document
    pub first_line_only: bool,
    /// May match past the end of the enclosing container
    pub extend_parent: bool,
    /// A match also closes the enclosing container
    pub end_parent: bool,
    /// The container closes at the end of the block
    pub end_at_line_end: bool,
    /// Only the inside of the container is styled, not its delimiters
    pub style_inside: bool,
    /// The container has no start of its own, it only groups its includes
    pub includes_only: bool,
}

impl Default for ContextFlags {
    fn default() -> Self {
        Self {
            once_only: false,
            first_line_only: false,
            extend_parent: true,
            end_parent: false,
            end_at_line_end: false,
            style_inside: false,
            includes_only: false,
        }
    }
}

/// A handle to a shared context
///
/// Several handles may point at the same context, each with its own style
/// override.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextRef {
    pub context: ContextId,
    /// Replaces the context's own style when set
    pub style: Option<StyleId>,
    /// Paint nothing for matches made through this handle
    pub ignore_style: bool,
}

impl ContextRef {
    /// Plain handle without overrides
    pub fn new(context: ContextId) -> Self {
        Self {
            context,
            style: None,
            ignore_style: false,
        }
    }
}

/// Which match a sub-pattern styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubPatternPosition {
    /// Inside a simple rule: the rule's own match
    #[default]
    Default,
    /// The start match of the enclosing container
    Start,
    /// The end match of the enclosing container
    End,
}

/// A capture group of the parent match, styled on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubPattern {
    pub group: GroupRef,
    pub position: SubPatternPosition,
}

/// A list of alternatives; the earliest-starting one wins
#[derive(Debug, Clone, Default)]
pub struct KeywordContext {
    pub keywords: Vec<Pattern>,
    pub flags: ContextFlags,
}

/// A single pattern. Without a pattern the rule only groups its includes.
#[derive(Debug, Clone, Default)]
pub struct SimpleContext {
    pub pattern: Option<Pattern>,
    pub includes: Vec<ContextRef>,
    pub flags: ContextFlags,
}

/// A region between a start and an end match that may span blocks
#[derive(Debug, Clone, Default)]
pub struct ContainerContext {
    pub start: Option<Pattern>,
    pub end: Option<Pattern>,
    pub includes: Vec<ContextRef>,
    pub flags: ContextFlags,
}

/// The shape of a rule
#[derive(Debug, Clone)]
pub enum ContextKind {
    Keyword(KeywordContext),
    Simple(SimpleContext),
    Container(ContainerContext),
    SubPattern(SubPattern),
}

/// A grammar rule with its own style
#[derive(Debug, Clone)]
pub struct Context {
    pub kind: ContextKind,
    pub style: Option<StyleId>,
}

impl Context {
    /// Create an unstyled context
    pub fn new(kind: ContextKind) -> Self {
        Self { kind, style: None }
    }

    /// Flags of the rule; sub-patterns carry none
    pub fn flags(&self) -> ContextFlags {
        match &self.kind {
            ContextKind::Keyword(kw) => kw.flags,
            ContextKind::Simple(simple) => simple.flags,
            ContextKind::Container(container) => container.flags,
            ContextKind::SubPattern(_) => ContextFlags::default(),
        }
    }

    /// Mutable access to the flags, `None` for sub-patterns
    pub fn flags_mut(&mut self) -> Option<&mut ContextFlags> {
        match &mut self.kind {
            ContextKind::Keyword(kw) => Some(&mut kw.flags),
            ContextKind::Simple(simple) => Some(&mut simple.flags),
            ContextKind::Container(container) => Some(&mut container.flags),
            ContextKind::SubPattern(_) => None,
        }
    }

    /// Included rules, empty for keywords and sub-patterns
    pub fn includes(&self) -> &[ContextRef] {
        match &self.kind {
            ContextKind::Simple(simple) => &simple.includes,
            ContextKind::Container(container) => &container.includes,
            ContextKind::Keyword(_) | ContextKind::SubPattern(_) => &[],
        }
    }

    /// Short name of the shape, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ContextKind::Keyword(_) => "keyword",
            ContextKind::Simple(_) => "simple",
            ContextKind::Container(_) => "container",
            ContextKind::SubPattern(_) => "sub-pattern",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags_extend_parent() {
        let flags = ContextFlags::default();
        assert!(flags.extend_parent);
        assert!(!flags.end_parent);
        assert!(!flags.once_only);
    }

    #[test]
    fn test_includes_by_kind() {
        let include = ContextRef::new(ContextId(3));
        let simple = Context::new(ContextKind::Simple(SimpleContext {
            includes: vec![include.clone()],
            ..Default::default()
        }));
        assert_eq!(simple.includes(), &[include]);
        assert_eq!(simple.kind_name(), "simple");

        let keyword = Context::new(ContextKind::Keyword(KeywordContext::default()));
        assert!(keyword.includes().is_empty());
    }

    #[test]
    fn test_sub_pattern_has_no_flags() {
        let mut sub = Context::new(ContextKind::SubPattern(SubPattern {
            group: GroupRef::Index(1),
            position: SubPatternPosition::Start,
        }));
        assert!(sub.flags_mut().is_none());
        assert_eq!(sub.flags(), ContextFlags::default());
    }
}
