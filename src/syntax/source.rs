//! Where language definitions come from
//!
//! Reading bytes is the host's business; the loader only asks a
//! [`DefinitionSource`] for the text of a definition by language id.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Extension of language definition files
pub const DEFINITION_EXTENSION: &str = "lang";

/// Provider of language definition text
pub trait DefinitionSource {
    /// Text of the definition for `id`, or `None` if there is none or it
    /// cannot be read
    fn read(&self, id: &str) -> Option<String>;

    /// Ids of all definitions this source knows about
    fn ids(&self) -> Vec<String>;
}

/// Definitions stored as `<dir>/<id>.lang` files in a list of directories.
/// Earlier directories take precedence.
#[derive(Debug, Clone, Default)]
pub struct DirectorySource {
    dirs: Vec<PathBuf>,
}

impl DirectorySource {
    /// Create a source searching `dirs` in order
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Directories searched, in order
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Path of the first existing definition file for `id`
    pub fn path_for_id(&self, id: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(format!("{}.{}", id, DEFINITION_EXTENSION)))
            .find(|path| path.is_file())
    }

    fn ids_in(dir: &Path) -> Vec<String> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "skipping language directory");
                return Vec::new();
            }
        };
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map_or(false, |ext| ext == DEFINITION_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect()
    }
}

impl DefinitionSource for DirectorySource {
    fn read(&self, id: &str) -> Option<String> {
        let path = self.path_for_id(id)?;
        match fs::read(&path) {
            // Encoding detection is left to the host; invalid UTF-8 is replaced
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read language definition");
                None
            }
        }
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.dirs.iter().flat_map(|dir| Self::ids_in(dir)).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Definitions held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    definitions: BTreeMap<String, String>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a definition
    pub fn insert(&mut self, id: &str, text: &str) {
        self.definitions.insert(id.to_string(), text.to_string());
    }

    /// Builder: add a definition
    pub fn with(mut self, id: &str, text: &str) -> Self {
        self.insert(id, text);
        self
    }
}

impl DefinitionSource for MemorySource {
    fn read(&self, id: &str) -> Option<String> {
        self.definitions.get(id).cloned()
    }

    fn ids(&self) -> Vec<String> {
        self.definitions.keys().cloned().collect()
    }
}

/// Several sources searched in order; the first one that has a definition wins
#[derive(Default)]
pub struct ChainSource {
    sources: Vec<Box<dyn DefinitionSource + Send + Sync>>,
}

impl ChainSource {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a source with lower precedence than the ones before it
    pub fn with(mut self, source: impl DefinitionSource + Send + Sync + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Number of chained sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the chain has no sources
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl DefinitionSource for ChainSource {
    fn read(&self, id: &str) -> Option<String> {
        self.sources.iter().find_map(|source| source.read(id))
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sources.iter().flat_map(|source| source.ids()).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
