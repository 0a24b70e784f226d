//! Syntax highlighting engine
//!
//! Language definitions are compiled by the [`GrammarLoader`] into a
//! [`Language`]: an arena of contexts and styles. A [`Highlighter`] runs a
//! language over one block of text at a time, taking the [`BlockState`] the
//! previous block ended in and returning paints plus the state for the next
//! block. Hosts keep the states; [`Document`] is a ready-made in-memory host.

pub mod builtin;
mod context;
mod document;
mod graph;
mod highlighter;
mod language;
mod loader;
mod manager;
mod metadata;
mod pattern;
mod preview;
mod regex_table;
mod source;
mod state;
mod style;
mod theme;
mod tokens;

pub use context::{
    ContainerContext, Context, ContextFlags, ContextId, ContextKind, ContextRef, KeywordContext,
    SimpleContext, StyleId, SubPattern, SubPatternPosition,
};
pub use document::{rehighlight, BlockId, BlockStore, Document};
pub use graph::{ContextGraph, Style};
pub use highlighter::{segments, BlockHighlight, Highlighter, Paint, Segment};
pub use language::Language;
pub use loader::GrammarLoader;
pub use manager::SyntaxManager;
pub use metadata::{LanguageDetector, LanguageMetadata, MetadataCatalog};
pub use pattern::{GroupRef, Pattern, RegexMatch};
pub use regex_table::RegexTable;
pub use source::{ChainSource, DefinitionSource, DirectorySource, MemorySource, DEFINITION_EXTENSION};
pub use state::{BlockState, ContainerInfo, StateToken};
pub use style::{Color, TextStyle};
pub use theme::{StyleResolver, Theme};
pub use tokens::DefaultStyle;
