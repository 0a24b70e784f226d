//! Regex macro table for language definitions
//!
//! Language files write patterns in a verbose dialect: whitespace and
//! `#` comments are insignificant, `\%[` and `\%]` stand for word
//! boundaries, and `\%{name}` expands a macro declared earlier in the same
//! file with `<define-regex>`. Everything here runs once, at load time.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Escaped characters, comment runs, line breaks and single whitespace.
/// Escapes are matched first so that `\ ` and `\#` survive stripping.
static INSIGNIFICANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\\.)|\s+#[^\n]*(?:\n\s*|$)|\s*\n\s*|\s").unwrap());

/// A macro reference. Start-match references (`\%{1@start}`) are excluded,
/// they are substituted per match by the highlighter.
static MACRO_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\%\{([^}@]+)\}").unwrap());

/// Registered `define-regex` macros of one language file
#[derive(Debug, Default, Clone)]
pub struct RegexTable {
    macros: HashMap<String, String>,
}

impl RegexTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a macro. The pattern is resolved against the macros known so
    /// far, so later definitions may build on earlier ones.
    pub fn define(&mut self, id: &str, pattern: &str) {
        let resolved = self.resolve(pattern);
        self.macros.insert(id.to_string(), resolved);
    }

    /// Turn a verbose pattern into plain regex syntax
    pub fn resolve(&self, pattern: &str) -> String {
        let compact = INSIGNIFICANT.replace_all(pattern, |caps: &Captures| {
            caps.get(1).map_or(String::new(), |m| m.as_str().to_string())
        });

        let bounded = compact.replace(r"\%[", r"\b").replace(r"\%]", r"\b");

        MACRO_REF
            .replace_all(&bounded, |caps: &Captures| match self.macros.get(&caps[1]) {
                Some(text) => text.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
