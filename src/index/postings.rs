use std::collections::{HashMap, HashSet};

use crate::core::types::TermMetadata;

/// One in-memory posting: a term's frequency in a document plus the
/// metadata recorded at ingest time.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingEntry {
    pub frequency: f64,
    pub metadata: TermMetadata,
}

/// The in-memory inverted index: `field -> term -> doc key -> posting`,
/// plus the dirty set of `(field, term)` pairs whose state differs from
/// storage. Doc keys are canonical strings.
#[derive(Debug, Default)]
pub struct PostingsStore {
    terms: HashMap<String, HashMap<String, HashMap<String, PostingEntry>>>,
    dirty: HashSet<(String, String)>,
}

impl PostingsStore {
    pub fn new() -> Self {
        PostingsStore::default()
    }

    /// Write or overwrite a posting and mark the pair dirty.
    pub fn upsert(&mut self, field: &str, term: &str, doc_key: &str, entry: PostingEntry) {
        self.insert_clean(field, term, doc_key, entry);
        self.mark_dirty(field, term);
    }

    /// Write a posting without dirtying the pair. Used when materialising
    /// chunks loaded from storage, whose state already matches disk.
    pub fn insert_clean(&mut self, field: &str, term: &str, doc_key: &str, entry: PostingEntry) {
        self.terms
            .entry(field.to_string())
            .or_default()
            .entry(term.to_string())
            .or_default()
            .insert(doc_key.to_string(), entry);
    }

    pub fn get(&self, field: &str, term: &str) -> Option<&HashMap<String, PostingEntry>> {
        self.terms.get(field)?.get(term)
    }

    /// Strip a document from every posting list in memory, marking each
    /// affected pair dirty. Emptied lists stay in the map until the next
    /// flush collects them for deletion.
    pub fn remove_document(&mut self, doc_key: &str) -> Vec<(String, String)> {
        let mut affected = Vec::new();
        for (field, terms) in &mut self.terms {
            for (term, documents) in terms.iter_mut() {
                if documents.remove(doc_key).is_some() {
                    affected.push((field.clone(), term.clone()));
                }
            }
        }
        for (field, term) in &affected {
            self.dirty.insert((field.clone(), term.clone()));
        }
        affected
    }

    pub fn remove_term(&mut self, field: &str, term: &str) {
        if let Some(terms) = self.terms.get_mut(field) {
            terms.remove(term);
            if terms.is_empty() {
                self.terms.remove(field);
            }
        }
    }

    pub fn mark_dirty(&mut self, field: &str, term: &str) {
        self.dirty.insert((field.to_string(), term.to_string()));
    }

    pub fn dirty_pairs(&self) -> Vec<(String, String)> {
        self.dirty.iter().cloned().collect()
    }

    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    pub fn clear(&mut self) {
        self.terms.clear();
        self.dirty.clear();
    }

    /// Every `(field, term, postings)` triple currently in memory.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&String, &String, &HashMap<String, PostingEntry>)> {
        self.terms.iter().flat_map(|(field, terms)| {
            terms
                .iter()
                .map(move |(term, documents)| (field, term, documents))
        })
    }

    pub fn term_count(&self) -> usize {
        self.terms.values().map(|terms| terms.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(frequency: f64) -> PostingEntry {
        PostingEntry {
            frequency,
            metadata: TermMetadata::default(),
        }
    }

    #[test]
    fn upsert_marks_dirty_and_overwrites() {
        let mut store = PostingsStore::new();
        store.upsert("title", "fox", "1", entry(1.0));
        store.upsert("title", "fox", "1", entry(3.0));

        let documents = store.get("title", "fox").unwrap();
        assert_eq!(documents.get("1").unwrap().frequency, 3.0);
        assert_eq!(store.dirty_pairs(), vec![("title".to_string(), "fox".to_string())]);
    }

    #[test]
    fn remove_document_touches_every_field() {
        let mut store = PostingsStore::new();
        store.upsert("title", "fox", "1", entry(1.0));
        store.upsert("body", "fox", "1", entry(2.0));
        store.upsert("body", "dog", "2", entry(1.0));
        store.clear_dirty();

        let mut affected = store.remove_document("1");
        affected.sort();
        assert_eq!(
            affected,
            vec![
                ("body".to_string(), "fox".to_string()),
                ("title".to_string(), "fox".to_string())
            ]
        );
        assert_eq!(store.dirty_len(), 2);
        // emptied lists survive until flush collects them
        assert!(store.get("title", "fox").unwrap().is_empty());
        assert_eq!(store.get("body", "dog").unwrap().len(), 1);
    }

    #[test]
    fn remove_term_drops_empty_fields() {
        let mut store = PostingsStore::new();
        store.upsert("title", "fox", "1", entry(1.0));
        store.remove_term("title", "fox");
        assert!(store.get("title", "fox").is_none());
        assert_eq!(store.term_count(), 0);
    }
}
