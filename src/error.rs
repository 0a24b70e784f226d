//! Error types for blocklight

use thiserror::Error;

/// Result type alias for blocklight operations
pub type Result<T> = std::result::Result<T, Error>;

/// Highlighting engine error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed language definition: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Expected <language> root element, found <{0}>")]
    NotALanguage(String),

    #[error("No language definition for id: {0}")]
    LanguageNotFound(String),

    #[error("{0}")]
    Message(String),
}
