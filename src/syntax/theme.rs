//! Mapping style ids to rendering attributes

use std::collections::HashMap;

use super::context::StyleId;
use super::graph::ContextGraph;
use super::style::TextStyle;
use super::tokens::DefaultStyle;

/// Turns a painted style into rendering attributes
pub trait StyleResolver {
    fn resolve(&self, graph: &ContextGraph, style: StyleId) -> TextStyle;
}

/// Rendering attributes by qualified style id
#[derive(Debug, Clone, Default)]
pub struct Theme {
    styles: HashMap<String, TextStyle>,
}

impl Theme {
    /// Create an empty theme; everything renders plain
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rendering of the `def:*` styles
    pub fn builtin() -> Self {
        let mut theme = Self::new();
        for style in DefaultStyle::ALL {
            theme.set(style.id(), style.default_style());
        }
        theme
    }

    /// Set the rendering of a style id
    pub fn set(&mut self, id: &str, style: TextStyle) {
        self.styles.insert(id.to_string(), style);
    }

    /// Rendering of exactly this id
    pub fn get(&self, id: &str) -> Option<TextStyle> {
        self.styles.get(id).copied()
    }

    /// Ids with an explicit rendering, sorted
    pub fn style_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.styles.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Builder: apply overrides on top of this theme
    pub fn with_overrides(mut self, overrides: &HashMap<String, TextStyle>) -> Self {
        for (id, style) in overrides {
            self.set(id, *style);
        }
        self
    }
}

impl StyleResolver for Theme {
    /// First style along the `map-to` chain that the theme knows,
    /// most specific first
    fn resolve(&self, graph: &ContextGraph, style: StyleId) -> TextStyle {
        graph
            .style_chain(style)
            .into_iter()
            .find_map(|id| self.get(&graph.style(id).id))
            .unwrap_or_default()
    }
}
