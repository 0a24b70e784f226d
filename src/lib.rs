//! blocklight - block-incremental syntax highlighting
//!
//! Highlights text one line ("block") at a time from declarative
//! GtkSourceView-style `.lang` definitions. Each block yields styled ranges
//! and an opaque state; re-highlighting after an edit stops as soon as a
//! block ends in the same state as before.

pub mod config;
pub mod error;
pub mod syntax;

pub use config::Config;
pub use error::{Error, Result};
