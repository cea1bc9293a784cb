use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Prefix shared by every anchor this subsystem creates. Anchors under this
/// prefix are ours to adopt or delete wholesale.
pub const ANCHOR_PREFIX: &str = "WMETA_";

/// Custom document properties are stored in segments of at most this many
/// characters per property value.
pub const PROPERTY_CHUNK_LEN: usize = 255;

lazy_static::lazy_static! {
    static ref ANCHOR_NAME_RE: Regex = Regex::new(r"^WMETA_(\d+)_(\d+)$").unwrap();
}

/// Anchor name for a word: `WMETA_{index}_{start in milliseconds}`.
pub fn anchor_name(index: usize, start: f64) -> String {
    format!("{}{}_{}", ANCHOR_PREFIX, index, (start * 1000.0).floor() as u64)
}

/// Parse the word index out of an anchor name, if it follows the convention.
pub fn parse_anchor_name(name: &str) -> Option<usize> {
    let caps = ANCHOR_NAME_RE.captures(name)?;
    caps[1].parse().ok()
}

/// Split a property value into the chunked `{prefix}_1`, `{prefix}_2`, ...
/// segments the host stores. Splitting is by character, so multi-byte text
/// never lands on a broken boundary.
pub fn property_chunks(prefix: &str, value: &str) -> Vec<(String, String)> {
    let chars: Vec<char> = value.chars().collect();
    chars
        .chunks(PROPERTY_CHUNK_LEN)
        .enumerate()
        .map(|(seq, piece)| {
            (
                format!("{}_{}", prefix, seq + 1),
                piece.iter().collect::<String>(),
            )
        })
        .collect()
}

/// Metadata persisted with each anchor as chunked custom properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorProperties {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub confidence: f64,
}

/// Word index → anchor name, for anchors known to exist in the document.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    by_index: BTreeMap<usize, String>,
    names: HashSet<String>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed anchor. Refuses to map the same anchor name from
    /// two different indices; the first binding wins.
    pub fn bind(&mut self, index: usize, name: String) -> bool {
        if self.by_index.contains_key(&index) {
            return false;
        }
        if !self.names.insert(name.clone()) {
            return false;
        }
        self.by_index.insert(index, name);
        true
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.by_index.get(&index).map(|s| s.as_str())
    }

    pub fn contains(&self, index: usize) -> bool {
        self.by_index.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_index.clear();
        self.names.clear();
    }

    /// Adopt anchors reported by the host listing. Only names following the
    /// convention whose index is valid for the current word count are taken.
    /// Returns how many were adopted.
    pub fn adopt(&mut self, names: &[String], word_count: usize) -> usize {
        let mut adopted = 0;
        for name in names {
            let Some(index) = parse_anchor_name(name) else {
                continue;
            };
            if index >= word_count {
                continue;
            }
            if self.bind(index, name.clone()) {
                adopted += 1;
            }
        }
        adopted
    }

    /// Word indices without a bound anchor, ascending.
    pub fn missing_indices(&self, word_count: usize) -> Vec<usize> {
        (0..word_count).filter(|i| !self.contains(*i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_name_roundtrip() {
        let name = anchor_name(42, 1.234);
        assert_eq!(name, "WMETA_42_1234");
        assert_eq!(parse_anchor_name(&name), Some(42));
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        assert_eq!(parse_anchor_name("BOOKMARK_1"), None);
        assert_eq!(parse_anchor_name("WMETA_x_12"), None);
        assert_eq!(parse_anchor_name("WMETA_3"), None);
    }

    #[test]
    fn test_bind_refuses_duplicate_name_for_second_index() {
        let mut reg = AnchorRegistry::new();
        assert!(reg.bind(0, "WMETA_0_0".into()));
        assert!(!reg.bind(1, "WMETA_0_0".into()));
        assert_eq!(reg.get(1), None);
    }

    #[test]
    fn test_adopt_filters_out_of_range_and_foreign() {
        let mut reg = AnchorRegistry::new();
        let names = vec![
            "WMETA_0_100".to_string(),
            "WMETA_7_900".to_string(), // out of range for 3 words
            "OTHER_1".to_string(),
            "WMETA_2_300".to_string(),
        ];
        assert_eq!(reg.adopt(&names, 3), 2);
        assert!(reg.contains(0));
        assert!(reg.contains(2));
        assert!(!reg.contains(7));
    }

    #[test]
    fn test_missing_indices_ascending() {
        let mut reg = AnchorRegistry::new();
        reg.bind(1, "WMETA_1_0".into());
        reg.bind(3, "WMETA_3_0".into());
        assert_eq!(reg.missing_indices(5), vec![0, 2, 4]);
    }

    #[test]
    fn test_property_chunks_split_at_255_chars() {
        let short = "a".repeat(255);
        let chunks = property_chunks("WMETA_0_0", &short);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].0, "WMETA_0_0_1");

        let long = "b".repeat(256);
        let chunks = property_chunks("WMETA_0_0", &long);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].1.len(), 255);
        assert_eq!(chunks[1].0, "WMETA_0_0_2");
        assert_eq!(chunks[1].1, "b");
    }

    #[test]
    fn test_property_chunks_respect_char_boundaries() {
        let value = "ü".repeat(300);
        let chunks = property_chunks("P", &value);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].1.chars().count(), 255);
        assert_eq!(chunks[1].1.chars().count(), 45);
    }
}
