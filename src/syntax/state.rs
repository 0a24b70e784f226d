//! State carried from one block to the next
//!
//! The only thing a block hands to the block below it is the list of
//! containers still open at its end. Two states are interchangeable exactly
//! when their lists are equal, which is what the token condenses.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::context::ContextRef;
use super::pattern::Pattern;

/// An open container: the rule, and its end pattern with any start-match
/// references already substituted
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerInfo {
    pub container: ContextRef,
    pub end: Option<Pattern>,
}

impl ContainerInfo {
    /// The language root; it has no end
    pub fn root(root: ContextRef) -> Self {
        Self {
            container: root,
            end: None,
        }
    }
}

/// Opaque fingerprint of a [`BlockState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateToken(u64);

impl StateToken {
    /// Raw value, for hosts that store states as integers
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Containers open at the end of a block, outermost first.
/// Index 0 is always the language root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockState {
    containers: Vec<ContainerInfo>,
}

impl BlockState {
    /// State before the first block: only the root is open
    pub fn root(root: ContextRef) -> Self {
        Self {
            containers: vec![ContainerInfo::root(root)],
        }
    }

    /// Build from containers collected innermost first
    pub(crate) fn from_innermost_first(mut containers: Vec<ContainerInfo>) -> Self {
        containers.reverse();
        Self { containers }
    }

    /// Open containers, outermost first
    pub fn containers(&self) -> &[ContainerInfo] {
        &self.containers
    }

    /// The most deeply nested open container
    pub fn innermost(&self) -> Option<&ContainerInfo> {
        self.containers.last()
    }

    /// Number of open containers besides the root
    pub fn depth(&self) -> usize {
        self.containers.len().saturating_sub(1)
    }

    /// Whether nothing but the root is open
    pub fn is_root_only(&self) -> bool {
        self.containers.len() == 1
    }

    /// Stable fingerprint; equal states have equal tokens
    pub fn token(&self) -> StateToken {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        StateToken(hasher.finish())
    }
}
