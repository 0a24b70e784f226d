//! Language metadata and language detection
//!
//! Metadata (display name, MIME types, filename globs) is read without
//! compiling the grammar. Mapping a file to a language id is a separate
//! collaborator behind [`LanguageDetector`]; [`MetadataCatalog`] is the
//! implementation built from the metadata blocks themselves.

use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

use super::source::DefinitionSource;
use crate::error::{Error, Result};

/// Descriptive data of a language definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageMetadata {
    pub id: String,
    pub name: String,
    pub section: Option<String>,
    pub hidden: bool,
    pub mimetypes: Vec<String>,
    pub globs: Vec<String>,
}

impl LanguageMetadata {
    /// Read metadata from a `<language>` element
    pub fn from_element(language: roxmltree::Node<'_, '_>) -> Self {
        let id = language.attribute("id").unwrap_or_default().to_string();
        let name = language
            .attribute("_name")
            .or_else(|| language.attribute("name"))
            .unwrap_or(id.as_str())
            .to_string();
        let section = language
            .attribute("_section")
            .or_else(|| language.attribute("section"))
            .map(str::to_string);
        let hidden = language.attribute("hidden") == Some("true");

        let mut metadata = Self {
            id,
            name,
            section,
            hidden,
            ..Default::default()
        };

        let properties = language
            .children()
            .filter(|n| n.has_tag_name("metadata"))
            .flat_map(|n| n.children())
            .filter(|n| n.has_tag_name("property"));
        for property in properties {
            let value = property.text().unwrap_or_default();
            match property.attribute("name") {
                Some("mimetypes") => metadata.mimetypes = split_list(value),
                Some("globs") => metadata.globs = split_list(value),
                // line-comment, block-comment-start and friends are for editors
                _ => {}
            }
        }

        metadata
    }

    /// Parse only the metadata of a definition
    pub fn parse(text: &str) -> Result<Self> {
        let document = roxmltree::Document::parse(text)?;
        let root = document.root_element();
        if !root.has_tag_name("language") {
            return Err(Error::NotALanguage(root.tag_name().name().to_string()));
        }
        Ok(Self::from_element(root))
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c| c == ';' || c == ',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Translate a filename glob into an anchored regex
fn glob_to_regex(glob: &str) -> Option<Regex> {
    let mut pattern = String::from("^");
    let mut literal = String::new();
    for ch in glob.chars() {
        match ch {
            '*' | '?' => {
                pattern.push_str(&regex::escape(&literal));
                literal.clear();
                pattern.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    pattern.push_str(&regex::escape(&literal));
    pattern.push('$');
    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!(glob, error = %err, "unusable filename glob");
            None
        }
    }
}

/// Maps a MIME type and/or filename to a language id
pub trait LanguageDetector {
    fn detect(&self, mime_type: Option<&str>, filename: Option<&str>) -> Option<String>;
}

struct CatalogEntry {
    metadata: LanguageMetadata,
    globs: Vec<Regex>,
}

/// Metadata of every known language, used for detection and listing
#[derive(Default)]
pub struct MetadataCatalog {
    entries: Vec<CatalogEntry>,
}

impl MetadataCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the metadata of every definition `source` lists.
    /// Unreadable definitions are skipped.
    pub fn from_source(source: &dyn DefinitionSource) -> Self {
        let mut catalog = Self::new();
        for id in source.ids() {
            let Some(text) = source.read(&id) else {
                continue;
            };
            match LanguageMetadata::parse(&text) {
                Ok(mut metadata) => {
                    if metadata.id.is_empty() {
                        metadata.id = id;
                    }
                    catalog.add(metadata);
                }
                Err(err) => warn!(language = %id, error = %err, "skipping language metadata"),
            }
        }
        catalog
    }

    /// Add or replace a language
    pub fn add(&mut self, metadata: LanguageMetadata) {
        let globs = metadata.globs.iter().filter_map(|g| glob_to_regex(g)).collect();
        self.entries.retain(|e| e.metadata.id != metadata.id);
        self.entries.push(CatalogEntry { metadata, globs });
        self.entries.sort_by(|a, b| a.metadata.id.cmp(&b.metadata.id));
    }

    /// Metadata of a language
    pub fn get(&self, id: &str) -> Option<&LanguageMetadata> {
        self.entries.iter().map(|e| &e.metadata).find(|m| m.id == id)
    }

    /// All languages, sorted by id
    pub fn languages(&self) -> impl Iterator<Item = &LanguageMetadata> {
        self.entries.iter().map(|e| &e.metadata)
    }

    /// Number of known languages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no language is known
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LanguageDetector for MetadataCatalog {
    fn detect(&self, mime_type: Option<&str>, filename: Option<&str>) -> Option<String> {
        let basename = filename
            .map(Path::new)
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str());

        if let Some(name) = basename {
            let hit = self
                .entries
                .iter()
                .find(|e| e.globs.iter().any(|g| g.is_match(name)));
            if let Some(entry) = hit {
                debug!(filename = name, language = %entry.metadata.id, "detected language by glob");
                return Some(entry.metadata.id.clone());
            }
        }

        let mime_type = mime_type?;
        self.entries
            .iter()
            .find(|e| e.metadata.mimetypes.iter().any(|m| m == mime_type))
            .map(|e| e.metadata.id.clone())
    }
}
