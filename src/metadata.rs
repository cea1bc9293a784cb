use crate::error::WordMetaError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_confidence() -> f64 {
    1.0
}

/// One entry of the import payload. Times are seconds. Any properties beyond
/// the known fields (speaker, language, ...) are kept in the open `extra` bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordImport {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub start: f64,
    /// Absent means a zero-length word at `start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Word metadata as held by the store. Immutable once imported; a re-import
/// replaces the whole sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub index: usize,
    pub word: String,
    pub start: f64,
    pub end: f64,
    pub confidence: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl WordRecord {
    /// Validate and number an import payload. Indices are assigned in payload
    /// order, contiguous from 0.
    pub fn from_imports(words: Vec<WordImport>) -> Result<Vec<WordRecord>, WordMetaError> {
        let mut records = Vec::with_capacity(words.len());
        for (index, item) in words.into_iter().enumerate() {
            let start = item.start;
            let end = item.end.unwrap_or(start);
            if !start.is_finite() || !end.is_finite() {
                return Err(WordMetaError::invalid_input(format!(
                    "word {} has a non-finite timestamp",
                    index
                )));
            }
            if start < 0.0 {
                return Err(WordMetaError::invalid_input(format!(
                    "word {} starts before 0s",
                    index
                )));
            }
            if end < start {
                return Err(WordMetaError::invalid_input(format!(
                    "word {} ends at {}s before it starts at {}s",
                    index, end, start
                )));
            }
            records.push(WordRecord {
                index,
                word: item.word,
                start,
                end,
                confidence: item.confidence,
                extra: item.extra,
            });
        }
        Ok(records)
    }

    /// Look up a property by name, covering both the fixed fields and the
    /// open bag.
    pub fn property(&self, key: &str) -> Option<Value> {
        match key {
            "word" => Some(Value::String(self.word.clone())),
            "index" => serde_json::to_value(self.index).ok(),
            "start" => serde_json::to_value(self.start).ok(),
            "end" => serde_json::to_value(self.end).ok(),
            "confidence" => serde_json::to_value(self.confidence).ok(),
            _ => self.extra.get(key).cloned(),
        }
    }
}

/// Time span covered by the imported words.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

/// Ordered, index-contiguous collection of word records.
#[derive(Debug, Default)]
pub struct MetadataStore {
    words: Vec<WordRecord>,
    imported_at: Option<DateTime<Utc>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole sequence with a validated import.
    pub fn replace(&mut self, records: Vec<WordRecord>) {
        self.words = records;
        self.imported_at = Some(Utc::now());
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.imported_at = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.imported_at.is_some()
    }

    pub fn imported_at(&self) -> Option<DateTime<Utc>> {
        self.imported_at
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WordRecord> {
        self.words.get(index)
    }

    pub fn all(&self) -> &[WordRecord] {
        &self.words
    }

    /// Export in the import format. Mirrors the upstream export shape: only
    /// the fixed fields survive, the open bag does not.
    pub fn export(&self) -> Vec<WordImport> {
        self.words
            .iter()
            .map(|w| WordImport {
                word: w.word.clone(),
                start: w.start,
                end: Some(w.end),
                confidence: w.confidence,
                extra: serde_json::Map::new(),
            })
            .collect()
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        let first = self.words.first()?;
        let last = self.words.last()?;
        Some(TimeRange {
            start: first.start,
            end: last.end,
        })
    }

    /// Binary search for the word whose span contains `time`.
    ///
    /// Containment is half-open: a timestamp shared between one word's end
    /// and the next word's start resolves to the later word. When no span
    /// contains `time`, returns the last word that ended before it, or None
    /// before the first word's start.
    pub fn find_by_time(&self, time: f64) -> Option<usize> {
        let mut left: isize = 0;
        let mut right: isize = self.words.len() as isize - 1;
        let mut result: Option<usize> = None;

        while left <= right {
            let mid = ((left + right) / 2) as usize;
            let word = &self.words[mid];

            if time >= word.start && time < word.end {
                return Some(mid);
            } else if time < word.start {
                right = mid as isize - 1;
            } else {
                result = Some(mid);
                left = mid as isize + 1;
            }
        }

        result
    }

    /// Linear scan for words whose property `key` equals `value`.
    pub fn find_by_property(&self, key: &str, value: &Value) -> Vec<usize> {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, w)| w.property(key).as_ref() == Some(value))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(spans: &[(&str, f64, f64)]) -> MetadataStore {
        let imports = spans
            .iter()
            .map(|(word, start, end)| WordImport {
                word: word.to_string(),
                start: *start,
                end: Some(*end),
                confidence: 1.0,
                extra: serde_json::Map::new(),
            })
            .collect();
        let mut s = MetadataStore::new();
        s.replace(WordRecord::from_imports(imports).unwrap());
        s
    }

    #[test]
    fn test_find_by_time_inside_span() {
        let s = store(&[("Hello", 0.0, 0.5), ("world", 0.5, 1.0)]);
        assert_eq!(s.find_by_time(0.3), Some(0));
        assert_eq!(s.find_by_time(0.7), Some(1));
    }

    #[test]
    fn test_find_by_time_shared_boundary_goes_to_later_word() {
        let s = store(&[("Hello", 0.0, 0.5), ("world", 0.5, 1.0)]);
        assert_eq!(s.find_by_time(0.5), Some(1));
    }

    #[test]
    fn test_find_by_time_before_first_word() {
        let s = store(&[("Hello", 1.0, 1.5), ("world", 1.5, 2.0)]);
        assert_eq!(s.find_by_time(0.5), None);
    }

    #[test]
    fn test_find_by_time_in_gap_returns_last_finished_word() {
        let s = store(&[("a", 0.0, 0.5), ("b", 2.0, 2.5), ("c", 4.0, 4.5)]);
        assert_eq!(s.find_by_time(1.0), Some(0));
        assert_eq!(s.find_by_time(3.0), Some(1));
    }

    #[test]
    fn test_find_by_time_after_last_word() {
        let s = store(&[("Hello", 0.0, 0.5), ("world", 0.5, 1.0)]);
        assert_eq!(s.find_by_time(5.0), Some(1));
    }

    #[test]
    fn test_import_rejects_end_before_start() {
        let imports = vec![WordImport {
            word: "x".into(),
            start: 2.0,
            end: Some(1.0),
            confidence: 1.0,
            extra: serde_json::Map::new(),
        }];
        assert!(matches!(
            WordRecord::from_imports(imports),
            Err(WordMetaError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_import_rejects_negative_start() {
        let payload = r#"[{"word": "x", "start": -1.0, "end": 0.5}]"#;
        let imports: Vec<WordImport> = serde_json::from_str(payload).unwrap();
        assert!(WordRecord::from_imports(imports).is_err());
    }

    #[test]
    fn test_import_defaults_missing_end_to_start() {
        let payload = r#"[{"word": "x", "start": 1.5}]"#;
        let imports: Vec<WordImport> = serde_json::from_str(payload).unwrap();
        let records = WordRecord::from_imports(imports).unwrap();
        assert_eq!(records[0].end, 1.5);
    }

    #[test]
    fn test_import_keeps_extra_properties() {
        let payload = r#"[{"word": "x", "start": 0.0, "end": 0.5, "speaker": "alice"}]"#;
        let imports: Vec<WordImport> = serde_json::from_str(payload).unwrap();
        let records = WordRecord::from_imports(imports).unwrap();
        assert_eq!(
            records[0].property("speaker"),
            Some(Value::String("alice".into()))
        );
    }

    #[test]
    fn test_find_by_property_matches_fixed_and_extra_fields() {
        let payload = r#"[
            {"word": "a", "start": 0.0, "end": 0.5, "speaker": "alice"},
            {"word": "b", "start": 0.5, "end": 1.0, "speaker": "bob"},
            {"word": "a", "start": 1.0, "end": 1.5, "speaker": "alice"}
        ]"#;
        let imports: Vec<WordImport> = serde_json::from_str(payload).unwrap();
        let mut s = MetadataStore::new();
        s.replace(WordRecord::from_imports(imports).unwrap());

        assert_eq!(
            s.find_by_property("speaker", &Value::String("alice".into())),
            vec![0, 2]
        );
        assert_eq!(
            s.find_by_property("word", &Value::String("a".into())),
            vec![0, 2]
        );
        assert!(s
            .find_by_property("speaker", &Value::String("carol".into()))
            .is_empty());
    }

    #[test]
    fn test_export_strips_extra_properties() {
        let payload = r#"[{"word": "x", "start": 0.0, "end": 0.5, "speaker": "alice"}]"#;
        let imports: Vec<WordImport> = serde_json::from_str(payload).unwrap();
        let mut s = MetadataStore::new();
        s.replace(WordRecord::from_imports(imports).unwrap());

        let exported = s.export();
        assert_eq!(exported.len(), 1);
        assert!(exported[0].extra.is_empty());
        assert_eq!(exported[0].word, "x");
    }

    #[test]
    fn test_time_range_spans_first_to_last() {
        let s = store(&[("a", 0.2, 0.5), ("b", 0.5, 1.0), ("c", 1.0, 2.5)]);
        let range = s.time_range().unwrap();
        assert_eq!(range.start, 0.2);
        assert_eq!(range.end, 2.5);
        assert!(MetadataStore::new().time_range().is_none());
    }

    #[test]
    fn test_clear_unloads_the_store() {
        let mut s = store(&[("a", 0.0, 0.5)]);
        assert!(s.is_loaded());
        s.clear();
        assert!(!s.is_loaded());
        assert_eq!(s.len(), 0);
    }
}
