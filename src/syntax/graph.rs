//! The compiled grammar
//!
//! Contexts and styles are stored in arenas and addressed by index. Names
//! are qualified as `language:id`; several names may point at the same node,
//! which is how `ref` shares rules between definitions and languages.

use std::collections::HashMap;

use super::context::{Context, ContextId, ContextRef, StyleId};

/// A named style and the style it falls back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    /// Qualified id, e.g. `c:comment`
    pub id: String,
    /// Display name from the definition
    pub name: Option<String>,
    /// Next link of the `map-to` chain
    pub map_to: Option<StyleId>,
}

impl Style {
    /// Create a style with no fallback
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            map_to: None,
        }
    }
}

/// Qualify `id` with `language` unless it already names a language
pub fn qualify(language: &str, id: &str) -> String {
    if id.contains(':') {
        id.to_string()
    } else {
        format!("{}:{}", language, id)
    }
}

/// Language prefix of a qualified id
pub fn language_of(id: &str) -> Option<&str> {
    id.split_once(':').map(|(language, _)| language)
}

/// Arena of contexts and styles with their qualified names
#[derive(Debug, Default, Clone)]
pub struct ContextGraph {
    contexts: Vec<Context>,
    context_names: HashMap<String, ContextId>,
    styles: Vec<Style>,
    style_names: HashMap<String, StyleId>,
}

impl ContextGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an anonymous context
    pub fn add_context(&mut self, context: Context) -> ContextId {
        let id = ContextId(self.contexts.len());
        self.contexts.push(context);
        id
    }

    /// Point `name` at an existing context, replacing any earlier binding
    pub fn register_context(&mut self, name: &str, id: ContextId) {
        self.context_names.insert(name.to_string(), id);
    }

    /// Look up a context by qualified name
    pub fn context_id(&self, name: &str) -> Option<ContextId> {
        self.context_names.get(name).copied()
    }

    /// Get a context
    pub fn context(&self, id: ContextId) -> &Context {
        &self.contexts[id.0]
    }

    /// Get a context for modification while loading
    pub fn context_mut(&mut self, id: ContextId) -> &mut Context {
        &mut self.contexts[id.0]
    }

    /// Number of context nodes
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Iterate over qualified context names, unordered
    pub fn context_names(&self) -> impl Iterator<Item = &str> {
        self.context_names.keys().map(String::as_str)
    }

    /// Add a style and register it under its id, replacing any earlier one
    pub fn add_style(&mut self, style: Style) -> StyleId {
        let id = StyleId(self.styles.len());
        self.style_names.insert(style.id.clone(), id);
        self.styles.push(style);
        id
    }

    /// Look up a style by qualified name
    pub fn style_id(&self, name: &str) -> Option<StyleId> {
        self.style_names.get(name).copied()
    }

    /// Get a style
    pub fn style(&self, id: StyleId) -> &Style {
        &self.styles[id.0]
    }

    /// The `map-to` chain of a style, most specific first
    pub fn style_chain(&self, id: StyleId) -> Vec<StyleId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(next) = self.style(current).map_to {
            if chain.contains(&next) {
                break;
            }
            chain.push(next);
            current = next;
        }
        chain
    }

    /// The last style of the `map-to` chain
    pub fn resolve_style(&self, id: StyleId) -> StyleId {
        self.style_chain(id).last().copied().unwrap_or(id)
    }

    /// Style painted for matches made through `reference`
    pub fn effective_style(&self, reference: &ContextRef) -> Option<StyleId> {
        if reference.ignore_style {
            return None;
        }
        reference.style.or(self.context(reference.context).style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::context::{ContextKind, KeywordContext};

    fn keyword() -> Context {
        Context::new(ContextKind::Keyword(KeywordContext::default()))
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("c", "comment"), "c:comment");
        assert_eq!(qualify("c", "def:comment"), "def:comment");
        assert_eq!(language_of("def:comment"), Some("def"));
        assert_eq!(language_of("comment"), None);
    }

    #[test]
    fn test_shared_context_names() {
        let mut graph = ContextGraph::new();
        let id = graph.add_context(keyword());
        graph.register_context("a:kw", id);
        graph.register_context("b:alias", id);
        assert_eq!(graph.context_id("a:kw"), Some(id));
        assert_eq!(graph.context_id("b:alias"), Some(id));
        assert_eq!(graph.context_count(), 1);
        assert_eq!(graph.context_names().count(), 2);
    }

    #[test]
    fn test_duplicate_style_overwrites() {
        let mut graph = ContextGraph::new();
        let first = graph.add_style(Style::new("a:s"));
        let second = graph.add_style(Style::new("a:s"));
        assert_ne!(first, second);
        assert_eq!(graph.style_id("a:s"), Some(second));
    }

    #[test]
    fn test_style_chain() {
        let mut graph = ContextGraph::new();
        let base = graph.add_style(Style::new("def:comment"));
        let mid = graph.add_style(Style {
            map_to: Some(base),
            ..Style::new("c:comment")
        });
        let top = graph.add_style(Style {
            map_to: Some(mid),
            ..Style::new("cpp:comment")
        });
        assert_eq!(graph.style_chain(top), vec![top, mid, base]);
        assert_eq!(graph.resolve_style(top), base);
        assert_eq!(graph.resolve_style(base), base);
    }

    #[test]
    fn test_effective_style() {
        let mut graph = ContextGraph::new();
        let own = graph.add_style(Style::new("a:own"));
        let other = graph.add_style(Style::new("a:other"));
        let mut context = keyword();
        context.style = Some(own);
        let id = graph.add_context(context);

        let plain = ContextRef::new(id);
        assert_eq!(graph.effective_style(&plain), Some(own));

        let overridden = ContextRef {
            style: Some(other),
            ..ContextRef::new(id)
        };
        assert_eq!(graph.effective_style(&overridden), Some(other));

        let ignored = ContextRef {
            ignore_style: true,
            ..ContextRef::new(id)
        };
        assert_eq!(graph.effective_style(&ignored), None);
    }
}
