//! Field-18 ("other information") extraction.
//!
//! Each key in the fixed pattern table is matched independently against the
//! whole tail, so markers may appear in any order or more than once (the
//! first occurrence wins).

use std::collections::BTreeMap;

use super::patterns::{Field18Key, FIELD18, KNOWN_UNUSED_MARKERS, MARKER};

/// Key/value items found in a field-18 tail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field18 {
    values: BTreeMap<Field18Key, String>,
    ignored: Vec<String>,
}

impl Field18 {
    /// Extract every recognized item from `tail`.
    #[must_use]
    pub fn extract(tail: &str) -> Self {
        if tail.is_empty() {
            return Self::default();
        }

        let values = FIELD18
            .iter()
            .filter_map(|pattern| {
                pattern
                    .extract(tail)
                    .map(|value| (pattern.key, value.to_string()))
            })
            .collect();

        Self {
            values,
            ignored: unrecognized_markers(tail),
        }
    }

    /// Value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: Field18Key) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Remove and return the value for `key`.
    pub fn take(&mut self, key: Field18Key) -> Option<String> {
        self.values.remove(&key)
    }

    /// Markers seen in the tail that no pattern consumes.
    #[must_use]
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    /// Number of recognized items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if nothing was recognized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `XXX/` markers that are neither table keys nor known-unused.
///
/// Spaces are stripped before the tail gets here, so a marker can be glued to
/// the previous value (`...03730EDEST/`); a marker ending in a known key
/// counts as that key.
fn unrecognized_markers(tail: &str) -> Vec<String> {
    let known = |name: &str| {
        FIELD18
            .iter()
            .map(|p| p.key.marker().trim_end_matches('/'))
            .chain(KNOWN_UNUSED_MARKERS.iter().copied())
            .any(|k| name.ends_with(k))
    };

    let mut ignored: Vec<String> = Vec::new();
    for caps in MARKER.captures_iter(tail) {
        let name = &caps[1];
        if !known(name) && !ignored.iter().any(|seen| seen == name) {
            ignored.push(name.to_string());
        }
    }
    ignored
}
