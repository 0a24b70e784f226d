//! A compiled language
//!
//! Bundles the context graph built by the loader with the root context and
//! the language's metadata. Immutable once built and shared between
//! documents behind an `Arc`.

use super::context::ContextRef;
use super::graph::ContextGraph;
use super::metadata::LanguageMetadata;
use super::state::BlockState;

/// A complete language definition for syntax highlighting
#[derive(Debug, Clone)]
pub struct Language {
    metadata: LanguageMetadata,
    graph: ContextGraph,
    root: ContextRef,
}

impl Language {
    /// Wrap a loaded graph
    pub fn new(metadata: LanguageMetadata, graph: ContextGraph, root: ContextRef) -> Self {
        Self {
            metadata,
            graph,
            root,
        }
    }

    /// Language id, e.g. `c`
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &LanguageMetadata {
        &self.metadata
    }

    /// The graph, including contexts and styles of referenced languages
    pub fn graph(&self) -> &ContextGraph {
        &self.graph
    }

    /// Handle to the `id:id` root context
    pub fn root(&self) -> &ContextRef {
        &self.root
    }

    /// State before the first block
    pub fn initial_state(&self) -> BlockState {
        BlockState::root(self.root.clone())
    }
}
