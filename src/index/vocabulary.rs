use std::collections::{HashMap, HashSet, VecDeque};

use crate::search::fuzzy::fuzzy_expand;

const EXPANSION_CACHE_CAPACITY: usize = 1000;

/// Bounded cache of fuzzy-expansion results keyed `"term:distance"`.
/// The oldest entry is dropped first when the cache is full.
#[derive(Debug, Default)]
struct ExpansionCache {
    entries: HashMap<String, Vec<String>>,
    order: VecDeque<String>,
}

impl ExpansionCache {
    fn get(&self, key: &str) -> Option<&Vec<String>> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: String, value: Vec<String>) {
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > EXPANSION_CACHE_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// The set of original (non-prefix) terms ever indexed. Append-only for
/// the session; cleared only with the rest of the engine state. Fuels
/// fuzzy expansion, whose cache is invalidated by any insertion.
#[derive(Debug, Default)]
pub struct Vocabulary {
    terms: HashSet<String>,
    dirty: bool,
    expansions: ExpansionCache,
}

impl Vocabulary {
    pub fn new() -> Self {
        Vocabulary::default()
    }

    /// Insert a term; returns true when the term is new. Any insertion
    /// invalidates every cached expansion.
    pub fn insert(&mut self, term: &str) -> bool {
        if self.terms.insert(term.to_string()) {
            self.dirty = true;
            self.expansions.clear();
            true
        } else {
            false
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Expand a query term through the vocabulary, caching the result.
    pub fn expand(&mut self, term: &str, distance: u8) -> Vec<String> {
        let key = format!("{}:{}", term, distance);
        if let Some(cached) = self.expansions.get(&key) {
            return cached.clone();
        }
        let matches = fuzzy_expand(term, distance, self.terms.iter());
        self.expansions.insert(key, matches.clone());
        matches
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Stable (sorted) array form for the `cache_state` store.
    pub fn snapshot(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.terms.iter().cloned().collect();
        terms.sort();
        terms
    }

    /// Replace all terms from a persisted array.
    pub fn load(&mut self, terms: Vec<String>) {
        self.terms = terms.into_iter().collect();
        self.expansions.clear();
        self.dirty = false;
    }

    pub fn clear(&mut self) {
        self.terms.clear();
        self.expansions.clear();
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut vocabulary = Vocabulary::new();
        assert!(vocabulary.insert("fox"));
        assert!(!vocabulary.insert("fox"));
        assert_eq!(vocabulary.len(), 1);
        assert!(vocabulary.is_dirty());
    }

    #[test]
    fn expansion_is_cached_until_mutation() {
        let mut vocabulary = Vocabulary::new();
        vocabulary.insert("anthropic");

        let first = vocabulary.expand("anthopric", 2);
        assert_eq!(first, vec!["anthropic"]);
        // cached path returns the same result
        assert_eq!(vocabulary.expand("anthopric", 2), first);

        // a new term within distance must invalidate the cache
        vocabulary.insert("anthoprics");
        let refreshed = vocabulary.expand("anthopric", 2);
        assert!(refreshed.contains(&"anthoprics".to_string()));
    }

    #[test]
    fn snapshot_round_trips() {
        let mut vocabulary = Vocabulary::new();
        vocabulary.insert("b");
        vocabulary.insert("a");
        let snapshot = vocabulary.snapshot();
        assert_eq!(snapshot, vec!["a", "b"]);

        let mut restored = Vocabulary::new();
        restored.load(snapshot);
        assert!(restored.contains("a"));
        assert!(!restored.is_dirty());
    }

    #[test]
    fn expansion_cache_is_bounded() {
        let mut vocabulary = Vocabulary::new();
        vocabulary.insert("target");
        for i in 0..1100 {
            vocabulary.expand(&format!("probe-{}", i), 1);
        }
        assert!(vocabulary.expansions.entries.len() <= 1000);
    }
}
