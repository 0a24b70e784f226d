//! Language registry
//!
//! This module provides the SyntaxManager that owns the definition sources,
//! detects languages by filename or MIME type, and compiles each language
//! once, sharing it between every document that uses it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::builtin;
use super::highlighter::Highlighter;
use super::language::Language;
use super::loader::GrammarLoader;
use super::metadata::{LanguageDetector, LanguageMetadata, MetadataCatalog};
use super::source::{ChainSource, DirectorySource};
use super::theme::Theme;
use crate::config::Config;

/// Main syntax highlighting manager
pub struct SyntaxManager {
    /// Where definitions are read from
    source: ChainSource,
    /// Metadata of every language the source knows
    catalog: MetadataCatalog,
    theme: Theme,
    /// Compiled languages by id; `None` remembers a failed load
    languages: HashMap<String, Option<Arc<Language>>>,
}

impl SyntaxManager {
    /// Create a manager over `source`
    pub fn new(source: ChainSource, theme: Theme) -> Self {
        let catalog = MetadataCatalog::from_source(&source);
        debug!(languages = catalog.len(), "language catalog built");
        Self {
            source,
            catalog,
            theme,
            languages: HashMap::new(),
        }
    }

    /// Create a manager with built-in languages and the built-in theme
    pub fn with_builtin() -> Self {
        Self::new(ChainSource::new().with(builtin::source()), Theme::builtin())
    }

    /// Create a manager from user settings. Configured directories take
    /// precedence over the built-in definitions.
    pub fn from_config(config: &Config) -> Self {
        let mut source = ChainSource::new();
        if !config.language_paths.is_empty() {
            source = source.with(DirectorySource::new(config.language_paths.iter().cloned()));
        }
        if config.builtin_languages {
            source = source.with(builtin::source());
        }
        Self::new(source, Theme::builtin().with_overrides(&config.theme))
    }

    /// Get a compiled language, loading it on first use.
    ///
    /// Returns `None` when the definition is missing or unusable; the
    /// failure is logged once and remembered.
    pub fn load_language_by_id(&mut self, id: &str) -> Option<Arc<Language>> {
        if let Some(cached) = self.languages.get(id) {
            return cached.clone();
        }

        let language = GrammarLoader::new(&self.source).into_language(id).map(Arc::new);
        if let Some(language) = &language {
            info!(
                language = id,
                contexts = language.graph().context_count(),
                "language loaded"
            );
        }
        self.languages.insert(id.to_string(), language.clone());
        language
    }

    /// Language id for a file, by filename glob first and MIME type second
    pub fn detect_language(&self, mime_type: Option<&str>, filename: Option<&str>) -> Option<String> {
        self.catalog.detect(mime_type, filename)
    }

    /// Detect and load the language of a file
    pub fn load_language_by_mime_or_filename(
        &mut self,
        mime_type: Option<&str>,
        filename: Option<&str>,
    ) -> Option<Arc<Language>> {
        let id = self.detect_language(mime_type, filename)?;
        self.load_language_by_id(&id)
    }

    /// A highlighter for a language id
    pub fn highlighter_for(&mut self, id: &str) -> Option<Highlighter> {
        self.load_language_by_id(id).map(Highlighter::new)
    }

    /// Languages worth offering to a user, sorted by id. Hidden helper
    /// definitions such as `def` are left out.
    pub fn list_languages(&self) -> Vec<&LanguageMetadata> {
        self.catalog.languages().filter(|m| !m.hidden).collect()
    }

    pub fn catalog(&self) -> &MetadataCatalog {
        &self.catalog
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Replace the theme; compiled languages are unaffected
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Forget compiled languages and failed loads, and re-read the catalog
    pub fn reload(&mut self) {
        self.languages.clear();
        self.catalog = MetadataCatalog::from_source(&self.source);
    }
}

impl Default for SyntaxManager {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::source::MemorySource;
    use crate::syntax::style::{Color, TextStyle};
    use crate::syntax::theme::StyleResolver;

    #[test]
    fn test_detect_language() {
        let manager = SyntaxManager::with_builtin();

        assert_eq!(manager.detect_language(None, Some("main.rs")).as_deref(), Some("rust"));
        assert_eq!(manager.detect_language(None, Some("src/test.py")).as_deref(), Some("python"));
        assert_eq!(manager.detect_language(None, Some("Cargo.toml")).as_deref(), Some("toml"));
        assert_eq!(manager.detect_language(None, Some("main.c")).as_deref(), Some("c"));
        assert_eq!(manager.detect_language(Some("text/x-python"), None).as_deref(), Some("python"));
        assert_eq!(manager.detect_language(None, Some("no_extension")), None);
    }

    #[test]
    fn test_languages_are_cached() {
        let mut manager = SyntaxManager::with_builtin();
        let first = manager.load_language_by_id("rust").unwrap();
        let second = manager.load_language_by_mime_or_filename(None, Some("lib.rs")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_missing_language() {
        let mut manager = SyntaxManager::with_builtin();
        assert!(manager.load_language_by_id("cobol").is_none());
        assert!(manager.highlighter_for("cobol").is_none());
        assert!(manager
            .load_language_by_mime_or_filename(Some("text/x-cobol"), Some("x.cbl"))
            .is_none());
    }

    #[test]
    fn test_list_hides_helpers() {
        let manager = SyntaxManager::with_builtin();
        let ids: Vec<&str> = manager.list_languages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "python", "rust", "toml"]);
    }

    #[test]
    fn test_highlighter_paints() {
        let mut manager = SyntaxManager::with_builtin();
        let highlighter = manager.highlighter_for("c").unwrap();
        let result = highlighter.highlight("return 0;", 0, None);
        assert_eq!(result.paints.len(), 2);
        let graph = highlighter.language().graph();
        let keyword = manager.theme().resolve(graph, result.paints[0].style);
        assert_eq!(keyword, manager.theme().get("def:keyword").unwrap());
    }

    #[test]
    fn test_from_config() {
        let mut config = Config {
            builtin_languages: false,
            ..Config::default()
        };
        config
            .theme
            .insert("def:keyword".to_string(), TextStyle::fg(Color::Red));
        let manager = SyntaxManager::from_config(&config);
        assert!(manager.list_languages().is_empty());
        assert_eq!(manager.theme().get("def:keyword"), Some(TextStyle::fg(Color::Red)));
    }

    #[test]
    fn test_user_definitions_take_precedence() {
        let user = MemorySource::new().with(
            "c",
            r#"<language id="c" _name="My C"><definitions>
                 <context id="c"><include/></context>
               </definitions></language>"#,
        );
        let source = ChainSource::new().with(user).with(builtin::source());
        let mut manager = SyntaxManager::new(source, Theme::builtin());
        assert_eq!(manager.catalog().get("c").unwrap().name, "My C");
        let c = manager.load_language_by_id("c").unwrap();
        assert_eq!(c.name(), "My C");
        assert!(manager.highlighter_for("c").unwrap().highlight("int x;", 0, None).paints.is_empty());
    }
}
