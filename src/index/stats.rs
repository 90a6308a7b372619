use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Persisted form of one document's length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocLengthEntry {
    pub doc_id: String,
    pub length: u64,
}

/// Per-document token totals with a running aggregate, keyed by canonical
/// doc id. Feeds document-length normalisation in scoring.
#[derive(Debug, Default)]
pub struct DocumentStats {
    lengths: HashMap<String, u64>,
    total_length: u64,
}

impl DocumentStats {
    pub fn new() -> Self {
        DocumentStats::default()
    }

    /// Store or overwrite a document's length, adjusting the total.
    pub fn add_document(&mut self, doc_key: &str, length: u64) {
        if let Some(previous) = self.lengths.insert(doc_key.to_string(), length) {
            self.total_length -= previous;
        }
        self.total_length += length;
    }

    pub fn remove_document(&mut self, doc_key: &str) {
        if let Some(previous) = self.lengths.remove(doc_key) {
            self.total_length -= previous;
        }
    }

    pub fn get(&self, doc_key: &str) -> Option<u64> {
        self.lengths.get(doc_key).copied()
    }

    pub fn document_count(&self) -> usize {
        self.lengths.len()
    }

    /// Mean document length, or 1.0 for an empty index so scoring never
    /// divides by zero.
    pub fn average_length(&self) -> f64 {
        if self.lengths.is_empty() {
            1.0
        } else {
            self.total_length as f64 / self.lengths.len() as f64
        }
    }

    /// Stable (sorted) array form for persistence and snapshots.
    pub fn snapshot(&self) -> Vec<DocLengthEntry> {
        let mut entries: Vec<DocLengthEntry> = self
            .lengths
            .iter()
            .map(|(doc_id, &length)| DocLengthEntry {
                doc_id: doc_id.clone(),
                length,
            })
            .collect();
        entries.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
        entries
    }

    /// Replace all state from a snapshot.
    pub fn load(&mut self, entries: Vec<DocLengthEntry>) {
        self.lengths.clear();
        self.total_length = 0;
        for entry in entries {
            self.add_document(&entry.doc_id, entry.length);
        }
    }

    pub fn clear(&mut self) {
        self.lengths.clear();
        self.total_length = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_defaults_to_one_when_empty() {
        assert_eq!(DocumentStats::new().average_length(), 1.0);
    }

    #[test]
    fn overwrite_adjusts_total() {
        let mut stats = DocumentStats::new();
        stats.add_document("a", 10);
        stats.add_document("b", 20);
        assert_eq!(stats.average_length(), 15.0);

        stats.add_document("a", 30);
        assert_eq!(stats.average_length(), 25.0);
        assert_eq!(stats.document_count(), 2);
    }

    #[test]
    fn remove_reverses_add() {
        let mut stats = DocumentStats::new();
        stats.add_document("a", 10);
        stats.remove_document("a");
        stats.remove_document("a"); // double remove is harmless
        assert_eq!(stats.document_count(), 0);
        assert_eq!(stats.average_length(), 1.0);
    }

    #[test]
    fn snapshot_round_trips_and_is_sorted() {
        let mut stats = DocumentStats::new();
        stats.add_document("b", 2);
        stats.add_document("a", 1);
        stats.add_document("c", 3);

        let snapshot = stats.snapshot();
        let ids: Vec<&str> = snapshot.iter().map(|e| e.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let mut restored = DocumentStats::new();
        restored.load(snapshot);
        assert_eq!(restored.document_count(), 3);
        assert_eq!(restored.average_length(), 2.0);
        assert_eq!(restored.get("b"), Some(2));
    }
}
