//! Provenance tracking for the dereferenced document

use crate::source::SourceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A physical position: source plus JSON pointer inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub source: SourceId,
    pub pointer: String,
}

impl Location {
    pub fn new(source: SourceId, pointer: impl Into<String>) -> Self {
        Self {
            source,
            pointer: pointer.into(),
        }
    }
}

/// Where a node of the logical document physically lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Final physical location after following every `$ref` hop
    pub location: Location,
    /// The `$ref` node that pulled this value in, if any
    pub from: Option<Location>,
}

/// Logical pointer → provenance, one entry per logical node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceMap {
    entries: BTreeMap<String, Provenance>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, logical_pointer: impl Into<String>, provenance: Provenance) {
        self.entries.insert(logical_pointer.into(), provenance);
    }

    pub fn get(&self, logical_pointer: &str) -> Option<&Provenance> {
        self.entries.get(logical_pointer)
    }

    /// Provenance of `logical_pointer`, or of its closest recorded ancestor
    pub fn lookup(&self, logical_pointer: &str) -> Option<&Provenance> {
        let mut pointer = logical_pointer;
        loop {
            if let Some(provenance) = self.entries.get(pointer) {
                return Some(provenance);
            }
            match pointer.rfind('/') {
                Some(index) => pointer = &pointer[..index],
                None => return None,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Provenance)> {
        self.entries.iter()
    }

    /// Move every entry under `from` (inclusive) to live under `to`
    ///
    /// Used when a sequence item disappears and later siblings shift down.
    pub(crate) fn rebase(&mut self, from: &str, to: &str) {
        let moved: Vec<String> = self
            .entries
            .keys()
            .filter(|key| is_within(key, from))
            .cloned()
            .collect();

        for key in moved {
            if let Some(provenance) = self.entries.remove(&key) {
                let new_key = format!("{to}{}", &key[from.len()..]);
                self.entries.insert(new_key, provenance);
            }
        }
    }

    pub(crate) fn extend(&mut self, other: ReferenceMap) {
        self.entries.extend(other.entries);
    }
}

/// A `$ref` whose target could not be loaded or found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedReference {
    /// Logical pointer where the resolved value would have been placed
    pub pointer: String,
    /// Physical location of the `$ref` node itself
    pub location: Location,
    /// `$ref` node the problem is attributed to: this node, or the first
    /// hop when it sits in a `$ref`-to-`$ref` chain
    pub from: Option<Location>,
    /// The raw `$ref` string
    pub target: String,
    /// Identity of the target source when it could be determined
    pub target_source: Option<SourceId>,
    pub reason: String,
}

impl UnresolvedReference {
    /// Move `pointer` from the `from` subtree to `to`
    pub(crate) fn rebase(&mut self, from: &str, to: &str) {
        if is_within(&self.pointer, from) {
            self.pointer = format!("{to}{}", &self.pointer[from.len()..]);
        }
    }
}

/// `pointer` is `root` or lies below it
fn is_within(pointer: &str, root: &str) -> bool {
    pointer
        .strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
