//! Compiled patterns and their matches
//!
//! A [`Pattern`] keeps the resolved source text next to the compiled regex.
//! Patterns that fail to compile are kept but never match, so one broken
//! rule does not take the rest of a language down with it.

use std::hash::{Hash, Hasher};

use once_cell::sync::Lazy;
use regex::{Captures, Regex, RegexBuilder};
use tracing::warn;

/// A back-reference from an end pattern to a group of the start match
static START_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\%\{([^}]+)@start\}").unwrap());

/// Reference to a capture group, by position or by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupRef {
    Index(usize),
    Name(String),
}

impl GroupRef {
    /// Parse a `sub-pattern` attribute value
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.parse::<usize>() {
            Ok(index) => GroupRef::Index(index),
            Err(_) => GroupRef::Name(value.to_string()),
        }
    }
}

/// A regex compiled from a language definition
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    case_insensitive: bool,
    regex: Option<Regex>,
}

impl Pattern {
    /// Compile a resolved pattern. Errors are logged and leave the pattern inert.
    pub fn compile(source: &str, case_insensitive: bool) -> Self {
        let regex = match RegexBuilder::new(source)
            .case_insensitive(case_insensitive)
            .build()
        {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!(pattern = source, error = %err, "invalid regular expression, rule disabled");
                None
            }
        };
        Self {
            source: source.to_string(),
            case_insensitive,
            regex,
        }
    }

    /// Keep an end pattern that references start groups uncompiled until the
    /// container is entered and the references can be substituted.
    pub fn deferred(source: &str, case_insensitive: bool) -> Self {
        if Self::references_start(source) {
            Self {
                source: source.to_string(),
                case_insensitive,
                regex: None,
            }
        } else {
            Self::compile(source, case_insensitive)
        }
    }

    fn references_start(source: &str) -> bool {
        START_REF.is_match(source)
    }

    /// The resolved pattern text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the pattern compiled
    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    /// Whether the pattern contains `\%{..@start}` references
    pub fn has_start_refs(&self) -> bool {
        Self::references_start(&self.source)
    }

    /// Search `text[..bound]` for the first match starting at or after `offset`.
    ///
    /// Text before `offset` still counts as context for anchors and word
    /// boundaries; text after `bound` is invisible to the search.
    pub fn find_at<'t>(&self, text: &'t str, offset: usize, bound: usize) -> Option<RegexMatch<'t>> {
        let regex = self.regex.as_ref()?;
        let bound = bound.min(text.len());
        if offset > bound || !text.is_char_boundary(bound) {
            return None;
        }
        regex
            .captures_at(&text[..bound], offset)
            .map(RegexMatch::from_captures)
    }

    /// Replace every `\%{N@start}` / `\%{name@start}` with the escaped text
    /// the start match captured for that group. Absent groups become empty.
    pub fn substitute_start_refs(&self, start: &RegexMatch<'_>) -> Pattern {
        if !self.has_start_refs() {
            return self.clone();
        }
        let source = START_REF.replace_all(&self.source, |caps: &Captures| {
            let group = GroupRef::parse(&caps[1]);
            regex::escape(start.group_text(&group).unwrap_or(""))
        });
        Pattern::compile(&source, self.case_insensitive)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.case_insensitive == other.case_insensitive
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.case_insensitive.hash(state);
    }
}

/// A successful match: either a real regex match with its capture groups,
/// or the synthetic empty match used for "end at line end".
#[derive(Debug)]
pub struct RegexMatch<'t> {
    captures: Option<Captures<'t>>,
    start: usize,
    end: usize,
}

impl<'t> RegexMatch<'t> {
    fn from_captures(captures: Captures<'t>) -> Self {
        let whole = captures.get(0).map_or((0, 0), |m| (m.start(), m.end()));
        Self {
            captures: Some(captures),
            start: whole.0,
            end: whole.1,
        }
    }

    /// Empty match at the end of the block
    pub fn line_end(position: usize) -> Self {
        Self {
            captures: None,
            start: position,
            end: position,
        }
    }

    /// Byte offset of the match start
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset just past the match
    pub fn end(&self) -> usize {
        self.end
    }

    /// Length of the whole match in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the match is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Byte range of a capture group, if it participated in the match
    pub fn group(&self, group: &GroupRef) -> Option<(usize, usize)> {
        let captures = match &self.captures {
            Some(captures) => captures,
            None => {
                return match group {
                    GroupRef::Index(0) => Some((self.start, self.end)),
                    _ => None,
                }
            }
        };
        let m = match group {
            GroupRef::Index(index) => captures.get(*index),
            GroupRef::Name(name) => captures.name(name),
        };
        m.map(|m| (m.start(), m.end()))
    }

    /// Text of a capture group
    pub fn group_text(&self, group: &GroupRef) -> Option<&'t str> {
        let captures = self.captures.as_ref()?;
        let m = match group {
            GroupRef::Index(index) => captures.get(*index),
            GroupRef::Name(name) => captures.name(name),
        };
        m.map(|m| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_at_respects_offset_and_bound() {
        let pattern = Pattern::compile(r"\d+", false);
        assert!(pattern.is_valid());

        let m = pattern.find_at("abc 123 def 45", 0, 14).unwrap();
        assert_eq!((m.start(), m.end()), (4, 7));

        let m = pattern.find_at("abc 123 def 45", 5, 14).unwrap();
        assert_eq!((m.start(), m.end()), (5, 7));

        let m = pattern.find_at("abc 123 def 45", 0, 6).unwrap();
        assert_eq!((m.start(), m.end()), (4, 6));

        assert!(pattern.find_at("abc 123 def 45", 8, 12).is_none());
        assert!(pattern.find_at("abc", 5, 3).is_none());
    }

    #[test]
    fn test_anchor_sees_preceding_text() {
        let pattern = Pattern::compile(r"^x", false);
        assert!(pattern.find_at("ax", 1, 2).is_none());
        assert!(pattern.find_at("xa", 0, 2).is_some());
    }

    #[test]
    fn test_invalid_pattern_never_matches() {
        let pattern = Pattern::compile(r"(unclosed", false);
        assert!(!pattern.is_valid());
        assert!(pattern.find_at("(unclosed", 0, 9).is_none());
    }

    #[test]
    fn test_case_insensitive() {
        let pattern = Pattern::compile("select", true);
        assert!(pattern.find_at("SELECT 1", 0, 8).is_some());
    }

    #[test]
    fn test_groups() {
        let pattern = Pattern::compile(r"(?P<key>\w+)=(\w+)", false);
        let m = pattern.find_at("a key=value", 0, 11).unwrap();
        assert_eq!(m.group(&GroupRef::Index(2)), Some((6, 11)));
        assert_eq!(m.group(&GroupRef::Name("key".into())), Some((2, 5)));
        assert_eq!(m.group(&GroupRef::Index(7)), None);
        assert_eq!(m.group_text(&GroupRef::Index(1)), Some("key"));
    }

    #[test]
    fn test_line_end_match() {
        let m = RegexMatch::line_end(10);
        assert!(m.is_empty());
        assert_eq!(m.group(&GroupRef::Index(0)), Some((10, 10)));
        assert_eq!(m.group(&GroupRef::Index(1)), None);
    }

    #[test]
    fn test_start_reference_substitution() {
        let start = Pattern::compile(r#"r(#*)""#, false);
        let end = Pattern::deferred(r#""\%{1@start}"#, false);
        assert!(end.has_start_refs());
        assert!(!end.is_valid());

        let text = r####"r##"raw"##"####;
        let m = start.find_at(text, 0, text.len()).unwrap();
        let compiled = end.substitute_start_refs(&m);
        assert!(compiled.is_valid());
        assert!(!compiled.has_start_refs());
        let closing = compiled.find_at(text, m.end(), text.len()).unwrap();
        assert_eq!((closing.start(), closing.end()), (7, 10));
    }

    #[test]
    fn test_named_start_reference_escapes_text() {
        let start = Pattern::compile(r"<<(?P<tag>[^\s]+)", false);
        let end = Pattern::deferred(r"^\%{tag@start}$", false);
        let m = start.find_at("<<E.O.F", 0, 7).unwrap();
        assert_eq!(end.substitute_start_refs(&m).source(), r"^E\.O\.F$");
    }

    #[test]
    fn test_group_ref_parse() {
        assert_eq!(GroupRef::parse("2"), GroupRef::Index(2));
        assert_eq!(GroupRef::parse("name"), GroupRef::Name("name".into()));
    }
}
