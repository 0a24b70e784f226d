//! Built-in language definitions
//!
//! The `.lang` files next to this module are compiled into the binary and
//! served through a [`MemorySource`], so highlighting works without any
//! definition directory on disk.

use super::source::MemorySource;

const DEFINITIONS: [(&str, &str); 5] = [
    ("def", include_str!("def.lang")),
    ("c", include_str!("c.lang")),
    ("python", include_str!("python.lang")),
    ("rust", include_str!("rust.lang")),
    ("toml", include_str!("toml.lang")),
];

/// Ids of the built-in languages
pub fn ids() -> impl Iterator<Item = &'static str> {
    DEFINITIONS.iter().map(|(id, _)| *id)
}

/// A source serving all built-in definitions
pub fn source() -> MemorySource {
    let mut source = MemorySource::new();
    for (id, text) in DEFINITIONS {
        source.insert(id, text);
    }
    source
}
