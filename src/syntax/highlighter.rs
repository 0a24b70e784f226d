//! Block-incremental highlighting
//!
//! A block is highlighted from its text and the state the previous block
//! ended in. The state lists the containers still open, outermost first;
//! they are resumed innermost first, each one scanning until its end and
//! handing the rest of the block to its parent.
//!
//! Offsets are byte offsets into the block text. Scanning functions take the
//! offset to start from and return the offset to resume from.

use std::sync::Arc;

use super::context::{ContextId, ContextKind, ContextRef, StyleId, SubPatternPosition};
use super::graph::ContextGraph;
use super::language::Language;
use super::pattern::RegexMatch;
use super::state::{BlockState, ContainerInfo, StateToken};

/// A styled range of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paint {
    /// Byte offset of the first styled byte
    pub start: usize,
    /// Length in bytes
    pub len: usize,
    pub style: StyleId,
}

impl Paint {
    /// Byte offset just past the range
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Result of highlighting one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHighlight {
    /// Non-overlapping paints, ordered by offset
    pub paints: Vec<Paint>,
    /// State to hand to the next block
    pub state: BlockState,
}

impl BlockHighlight {
    /// Fingerprint of the resulting state
    pub fn token(&self) -> StateToken {
        self.state.token()
    }
}

/// A run of block text and the style painted on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'t> {
    pub start: usize,
    pub text: &'t str,
    pub style: Option<StyleId>,
}

/// Split `text` into styled and unstyled runs. Paints that overlap an
/// earlier one or do not fall on character boundaries are skipped.
pub fn segments<'t>(text: &'t str, paints: &[Paint]) -> Vec<Segment<'t>> {
    let mut sorted: Vec<Paint> = paints.to_vec();
    sorted.sort_by_key(|p| p.start);

    let mut result = Vec::new();
    let mut cursor = 0;
    for paint in sorted {
        let end = paint.end().min(text.len());
        if paint.start < cursor
            || paint.start >= end
            || !text.is_char_boundary(paint.start)
            || !text.is_char_boundary(end)
        {
            continue;
        }
        if paint.start > cursor {
            result.push(Segment {
                start: cursor,
                text: &text[cursor..paint.start],
                style: None,
            });
        }
        result.push(Segment {
            start: paint.start,
            text: &text[paint.start..end],
            style: Some(paint.style),
        });
        cursor = end;
    }
    if cursor < text.len() {
        result.push(Segment {
            start: cursor,
            text: &text[cursor..],
            style: None,
        });
    }
    result
}

/// Highlights blocks of one language
#[derive(Debug, Clone)]
pub struct Highlighter {
    language: Arc<Language>,
}

impl Highlighter {
    /// Create a highlighter for a loaded language
    pub fn new(language: Arc<Language>) -> Self {
        Self { language }
    }

    pub fn language(&self) -> &Arc<Language> {
        &self.language
    }

    /// State before the first block
    pub fn initial_state(&self) -> BlockState {
        self.language.initial_state()
    }

    /// Highlight one block.
    ///
    /// `position` is the block's offset in the document; only the block at
    /// position 0 matches first-line-only rules. `previous` is the state of
    /// the block above, `None` for the first block.
    pub fn highlight(&self, text: &str, position: usize, previous: Option<&BlockState>) -> BlockHighlight {
        let initial;
        let previous = match previous {
            Some(state) => state,
            None => {
                initial = self.initial_state();
                &initial
            }
        };

        let mut pass = Pass::new(self.language.graph(), text, position == 0);
        let containers = previous.containers();
        let mut offset = 0;
        let mut index = containers.len();
        while index > 0 {
            index -= 1;
            let info = &containers[index];
            let (end, next) = pass.till_container_end(offset, info.clone(), 0, index == 0);
            offset = next;
            if end.is_none() {
                continue;
            }
            // An end-parent container closes its ancestors with it, except the root
            let mut closed = info;
            while index > 1 && pass.graph.context(closed.container.context).flags().end_parent {
                index -= 1;
                closed = &containers[index];
            }
        }

        BlockHighlight {
            paints: pass.formats.into_paints(),
            state: BlockState::from_innermost_first(pass.open),
        }
    }
}

/// Style of every byte of the block
struct FormatBuffer {
    cells: Vec<Option<StyleId>>,
}

/// Cells saved before a container paints over them
struct SavedCells {
    from: usize,
    cells: Vec<Option<StyleId>>,
}

impl FormatBuffer {
    fn new(len: usize) -> Self {
        Self {
            cells: vec![None; len],
        }
    }

    fn fill(&mut self, start: usize, end: usize, style: StyleId) {
        let end = end.min(self.cells.len());
        if start < end {
            self.cells[start..end].fill(Some(style));
        }
    }

    fn save(&self, from: usize) -> SavedCells {
        let from = from.min(self.cells.len());
        SavedCells {
            from,
            cells: self.cells[from..].to_vec(),
        }
    }

    /// Put back what was there before the save, from `from` to the end
    fn restore(&mut self, saved: &SavedCells, from: usize) {
        let from = from.max(saved.from).min(self.cells.len());
        let skip = from - saved.from;
        self.cells[from..].copy_from_slice(&saved.cells[skip..]);
    }

    fn into_paints(self) -> Vec<Paint> {
        let mut paints: Vec<Paint> = Vec::new();
        for (offset, cell) in self.cells.into_iter().enumerate() {
            let Some(style) = cell else {
                continue;
            };
            match paints.last_mut() {
                Some(last) if last.style == style && last.end() == offset => last.len += 1,
                _ => paints.push(Paint {
                    start: offset,
                    len: 1,
                    style,
                }),
            }
        }
        paints
    }
}

/// A rule that matched, and the handle it was reached through
struct Candidate<'g, 't> {
    reference: &'g ContextRef,
    found: RegexMatch<'t>,
}

/// A container being scanned. The forbidden set lives only as long as the scan.
struct Scope {
    info: ContainerInfo,
    forbidden: Vec<ContextRef>,
    /// The language root, which nothing closes
    root: bool,
}

/// What the scan of a scope does after handling a match
enum Flow<'t> {
    Continue(usize),
    Stop(Option<RegexMatch<'t>>, usize),
}

/// One highlighting pass over one block
struct Pass<'g, 't> {
    graph: &'g ContextGraph,
    text: &'t str,
    first_block: bool,
    formats: FormatBuffer,
    /// Containers left open, innermost first
    open: Vec<ContainerInfo>,
}

impl<'g, 't> Pass<'g, 't> {
    fn new(graph: &'g ContextGraph, text: &'t str, first_block: bool) -> Self {
        Self {
            graph,
            text,
            first_block,
            formats: FormatBuffer::new(text.len()),
            open: Vec::new(),
        }
    }

    /// Scan a container from `offset`, where its start delimiter of
    /// `start_len` bytes begins, to its end. Unclosed containers are added
    /// to the open list.
    fn till_container_end(
        &mut self,
        offset: usize,
        info: ContainerInfo,
        start_len: usize,
        root: bool,
    ) -> (Option<RegexMatch<'t>>, usize) {
        let graph = self.graph;
        let context = graph.context(info.container.context);
        let flags = context.flags();
        let inner_start = offset + start_len;
        let paint_start = if flags.style_inside { inner_start } else { offset };

        // Paint to the end of the block for now; the part after the real end
        // gets back whatever was under it
        let saved = self.formats.save(paint_start);
        if let Some(style) = graph.effective_style(&info.container) {
            self.formats.fill(paint_start, self.text.len(), style);
        }

        let mut scope = Scope {
            info,
            forbidden: Vec::new(),
            root,
        };
        let (end, next) = self.scan(inner_start, &mut scope);

        match &end {
            Some(found) => {
                let paint_end = if flags.style_inside { found.start() } else { found.end() };
                self.formats.restore(&saved, paint_end.max(paint_start));
                self.paint_sub_patterns(context.includes(), found, |p| p == SubPatternPosition::End);
            }
            None => self.open.push(scope.info),
        }
        (end, next)
    }

    /// Scan the inside of a scope. Returns the match that closed it, `None`
    /// if the block ran out first, and the offset after it.
    fn scan(&mut self, mut offset: usize, scope: &mut Scope) -> (Option<RegexMatch<'t>>, usize) {
        let len = self.text.len();
        loop {
            let end = self.container_end(offset, &scope.info);
            if offset >= len {
                return (end, offset);
            }

            let bound = end.as_ref().map_or(len, |m| m.start());
            let Some(candidate) = self.find_match(offset, bound, scope) else {
                let next = end.as_ref().map_or(len, |m| m.end());
                return (end, next);
            };
            if let Some(found) = &end {
                if found.start() <= candidate.found.start() {
                    let next = found.end();
                    return (end, next);
                }
            }

            let next = match self.dispatch(candidate, scope) {
                Flow::Continue(next) => next,
                // end-parent rules matched in the root close nothing
                Flow::Stop(Some(_), next) if scope.root => next,
                Flow::Stop(end, next) => return (end, next),
            };
            offset = if next > offset {
                next
            } else {
                next_char_boundary(self.text, offset)
            };
        }
    }

    /// The end match of a scope at or after `offset`
    fn container_end(&self, offset: usize, info: &ContainerInfo) -> Option<RegexMatch<'t>> {
        let found = info
            .end
            .as_ref()
            .filter(|pattern| !pattern.source().is_empty())
            .and_then(|pattern| pattern.find_at(self.text, offset, self.text.len()));
        if found.is_some() {
            return found;
        }
        let flags = self.graph.context(info.container.context).flags();
        flags
            .end_at_line_end
            .then(|| RegexMatch::line_end(self.text.len()))
    }

    fn dispatch(&mut self, candidate: Candidate<'g, 't>, scope: &mut Scope) -> Flow<'t> {
        let graph = self.graph;
        let Candidate { reference, found } = candidate;
        let context = graph.context(reference.context);
        let flags = context.flags();
        if flags.once_only {
            scope.forbidden.push(reference.clone());
        }

        match &context.kind {
            ContextKind::Keyword(_) => {
                self.paint(found.start(), found.end(), graph.effective_style(reference));
                let next = found.end();
                if flags.end_parent {
                    return Flow::Stop(Some(found), next);
                }
                Flow::Continue(next)
            }
            ContextKind::Simple(simple) => {
                self.paint(found.start(), found.end(), graph.effective_style(reference));
                self.paint_sub_patterns(&simple.includes, &found, |p| p != SubPatternPosition::End);
                let next = found.end();
                if flags.end_parent {
                    return Flow::Stop(Some(found), next);
                }
                Flow::Continue(next)
            }
            ContextKind::Container(container) => {
                let end = container
                    .end
                    .as_ref()
                    .map(|pattern| pattern.substitute_start_refs(&found));
                let info = ContainerInfo {
                    container: reference.clone(),
                    end,
                };
                let (end, next) = self.till_container_end(found.start(), info, found.len(), false);
                self.paint_sub_patterns(&container.includes, &found, |p| p == SubPatternPosition::Start);

                if flags.end_parent {
                    return Flow::Stop(end, next);
                }
                if flags.extend_parent && end.is_none() {
                    return Flow::Stop(None, next);
                }
                Flow::Continue(next)
            }
            ContextKind::SubPattern(_) => Flow::Continue(found.end()),
        }
    }

    /// Leftmost match among the rules the scope includes. `bound` is where
    /// the scope ends; rules that may not extend their parent must match
    /// before it.
    fn find_match(&self, offset: usize, bound: usize, scope: &Scope) -> Option<Candidate<'g, 't>> {
        let graph = self.graph;
        let id = scope.info.container.context;
        let mut expanding = vec![id];
        self.search_includes(graph.context(id).includes(), offset, bound, &scope.forbidden, &mut expanding)
    }

    fn search_includes(
        &self,
        includes: &'g [ContextRef],
        offset: usize,
        bound: usize,
        forbidden: &[ContextRef],
        expanding: &mut Vec<ContextId>,
    ) -> Option<Candidate<'g, 't>> {
        let mut best: Option<Candidate<'g, 't>> = None;
        for reference in includes {
            let Some(candidate) = self.match_reference(reference, offset, bound, forbidden, expanding) else {
                continue;
            };
            // Ties keep the earlier rule
            if best
                .as_ref()
                .map_or(true, |b| candidate.found.start() < b.found.start())
            {
                best = Some(candidate);
            }
        }
        best
    }

    fn match_reference(
        &self,
        reference: &'g ContextRef,
        offset: usize,
        bound: usize,
        forbidden: &[ContextRef],
        expanding: &mut Vec<ContextId>,
    ) -> Option<Candidate<'g, 't>> {
        let graph = self.graph;
        let context = graph.context(reference.context);
        let flags = context.flags();
        if flags.first_line_only && !self.first_block {
            return None;
        }
        if forbidden.contains(reference) {
            return None;
        }
        let limit = if flags.extend_parent { self.text.len() } else { bound };

        let found = match &context.kind {
            ContextKind::SubPattern(_) => None,
            ContextKind::Keyword(keyword) => {
                let mut best: Option<RegexMatch<'t>> = None;
                for pattern in &keyword.keywords {
                    if let Some(found) = pattern.find_at(self.text, offset, limit) {
                        if best.as_ref().map_or(true, |b| found.start() < b.start()) {
                            best = Some(found);
                        }
                    }
                }
                best
            }
            ContextKind::Simple(simple) => match &simple.pattern {
                Some(pattern) => pattern.find_at(self.text, offset, limit),
                None => {
                    return self.expand(reference.context, &simple.includes, offset, bound, forbidden, expanding)
                }
            },
            ContextKind::Container(container) => match &container.start {
                Some(start) if !container.flags.includes_only => start.find_at(self.text, offset, limit),
                _ => {
                    return self.expand(reference.context, &container.includes, offset, bound, forbidden, expanding)
                }
            },
        };
        found.map(|found| Candidate { reference, found })
    }

    /// Search the includes of a grouping rule. A group that is already being
    /// searched further up contributes nothing.
    fn expand(
        &self,
        id: ContextId,
        includes: &'g [ContextRef],
        offset: usize,
        bound: usize,
        forbidden: &[ContextRef],
        expanding: &mut Vec<ContextId>,
    ) -> Option<Candidate<'g, 't>> {
        if expanding.contains(&id) {
            return None;
        }
        expanding.push(id);
        let found = self.search_includes(includes, offset, bound, forbidden, expanding);
        expanding.pop();
        found
    }

    fn paint(&mut self, start: usize, end: usize, style: Option<StyleId>) {
        if let Some(style) = style {
            self.formats.fill(start, end, style);
        }
    }

    /// Paint the capture groups that sub-pattern includes select
    fn paint_sub_patterns<F>(&mut self, includes: &[ContextRef], found: &RegexMatch<'_>, wanted: F)
    where
        F: Fn(SubPatternPosition) -> bool,
    {
        let graph = self.graph;
        for reference in includes {
            let ContextKind::SubPattern(sub) = &graph.context(reference.context).kind else {
                continue;
            };
            if !wanted(sub.position) {
                continue;
            }
            if let Some((start, end)) = found.group(&sub.group) {
                self.paint(start, end, graph.effective_style(reference));
            }
        }
    }
}

fn next_char_boundary(text: &str, offset: usize) -> usize {
    let mut next = offset + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next.min(text.len())
}
