//! Configuration file support
//!
//! Loads settings from ~/.blocklight.toml (or %USERPROFILE%\.blocklight.toml on Windows)
//!
//! Example:
//! ```toml
//! language-paths = ["~/.local/share/blocklight/languages"]
//! builtin-languages = true
//! preview-blocks = 9
//! preview-font = "monospace"
//!
//! [theme."def:comment"]
//! fg = "green"
//! italic = true
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::syntax::TextStyle;

/// Configuration settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Extra directories holding `<id>.lang` files, searched before the built-ins
    pub language_paths: Vec<PathBuf>,
    /// Whether the grammars compiled into the binary are used
    pub builtin_languages: bool,
    /// Number of blocks in a preview fragment
    pub preview_blocks: usize,
    /// Font family of preview fragments
    pub preview_font: String,
    /// Rendering overrides by style id
    pub theme: HashMap<String, TextStyle>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language_paths: Vec::new(),
            builtin_languages: true,
            preview_blocks: 9,
            preview_font: "monospace".to_string(),
            theme: HashMap::new(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".blocklight.toml"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".blocklight.toml"))
        }
    }

    /// Load configuration from the default location. A missing file gives
    /// the defaults; so does a broken one, after a warning.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring configuration file");
                Self::default()
            }
        }
    }

    /// Load configuration from a file. A missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                debug!(path = %path.display(), "loading configuration");
                Self::parse(&contents)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Parse config file contents
    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.preview_blocks = config.preview_blocks.max(1);
        config.language_paths = config.language_paths.iter().map(|p| expand_home(p)).collect();
        Ok(config)
    }
}

/// Replace a leading `~` with the home directory
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    let home = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    match std::env::var(home) {
        Ok(home) => PathBuf::from(home).join(rest),
        Err(_) => path.to_path_buf(),
    }
}
