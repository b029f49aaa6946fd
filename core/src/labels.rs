//! Label mapping table.
//!
//! Resolves a class index produced by the model to a human-readable rune
//! name. Indices need not be contiguous or unique: lookups always return the
//! first matching entry in table order.

use serde::{Deserialize, Serialize};

/// Label emitted when no mapping resolves an index.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One `index -> name` pair of the mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMappingEntry {
    /// Class index returned by the model.
    pub index: i32,
    /// Rune name for that index.
    pub name: String,
}

impl LabelMappingEntry {
    pub fn new(index: i32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// Ordered label mapping table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMapping {
    entries: Vec<LabelMappingEntry>,
}

impl LabelMapping {
    pub fn new(entries: Vec<LabelMappingEntry>) -> Self {
        Self { entries }
    }

    /// Name of the first entry whose index equals `index`.
    pub fn lookup(&self, index: i32) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.index == index)
            .map(|entry| entry.name.as_str())
    }

    /// Index of the first entry named `Unknown`, compared case-insensitively.
    pub fn unknown_index(&self) -> Option<i32> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(UNKNOWN_LABEL))
            .map(|entry| entry.index)
    }

    pub fn entries(&self) -> &[LabelMappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry at the end of the table.
    pub fn push(&mut self, entry: LabelMappingEntry) {
        self.entries.push(entry);
    }
}

impl FromIterator<LabelMappingEntry> for LabelMapping {
    fn from_iter<I: IntoIterator<Item = LabelMappingEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<S: Into<String>> FromIterator<(i32, S)> for LabelMapping {
    fn from_iter<I: IntoIterator<Item = (i32, S)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(index, name)| LabelMappingEntry::new(index, name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_first_match() {
        let table: LabelMapping = [(0, "Fire"), (1, "Water"), (0, "Ember")]
            .into_iter()
            .collect();
        assert_eq!(table.lookup(0), Some("Fire"));
        assert_eq!(table.lookup(1), Some("Water"));
        assert_eq!(table.lookup(7), None);
    }

    #[test]
    fn unknown_index_ignores_case() {
        let table: LabelMapping = [(0, "Fire"), (9, "UNKNOWN"), (5, "Unknown")]
            .into_iter()
            .collect();
        assert_eq!(table.unknown_index(), Some(9));

        let table: LabelMapping = [(0, "Fire")].into_iter().collect();
        assert_eq!(table.unknown_index(), None);
    }

    #[test]
    fn deserializes_from_plain_list() {
        let yaml = "- { index: 0, name: Fire }\n- { index: 5, name: unknown }\n";
        let table: LabelMapping = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.unknown_index(), Some(5));
    }
}
