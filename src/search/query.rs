use std::collections::HashMap;

use crate::analysis::pipeline::Pipeline;
use crate::codec::ChunkValue;
use crate::core::error::Result;
use crate::core::types::{TermMetadata, TermPosting};
use crate::index::vocabulary::Vocabulary;
use crate::search::mode::SearchMode;

pub const DEFAULT_LIMIT: usize = 10;
/// Boost for terms reached through fuzzy expansion; exact terms keep 1.0.
pub const FUZZY_EXPANSION_BOOST: f64 = 0.8;

/// Search options. Unset fields search the engine's configured field list
/// with the default limit.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub fields: Option<Vec<String>>,
    pub limit: usize,
    pub fuzzy: Option<u8>,
    pub mode: Option<SearchMode>,
    pub min_score: f64,
    /// Run the query through the index-time n-gram expansion. Off by
    /// default: n-grams are an index-side expansion.
    pub apply_query_ngrams: bool,
    /// Attach stored payloads to detailed hits.
    pub include_stored: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            fields: None,
            limit: DEFAULT_LIMIT,
            fuzzy: None,
            mode: None,
            min_score: 0.0,
            apply_query_ngrams: false,
            include_stored: false,
        }
    }
}

/// One `(field, term)` probe with its scoring boost.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryToken {
    pub field: String,
    pub term: String,
    pub boost: f64,
}

/// Tokenize the query per field, deduplicate `(field, term)` pairs, and
/// append fuzzy expansions at the reduced boost. Exact terms always keep
/// boost 1.0, and an expansion never displaces an exact pair.
pub fn build_query_tokens(
    query: &str,
    fields: &[String],
    pipeline: &Pipeline,
    vocabulary: &mut Vocabulary,
    fuzzy_distance: Option<u8>,
) -> Result<Vec<QueryToken>> {
    let mut tokens: Vec<QueryToken> = Vec::new();
    let mut seen: HashMap<(String, String), usize> = HashMap::new();

    for field in fields {
        for token in pipeline.run(field, None, query)? {
            let key = (field.clone(), token.value.clone());
            if seen.contains_key(&key) {
                continue;
            }
            seen.insert(key, tokens.len());
            tokens.push(QueryToken {
                field: field.clone(),
                term: token.value,
                boost: 1.0,
            });
        }
    }

    if let Some(distance) = fuzzy_distance {
        let exact: Vec<(String, String)> = tokens
            .iter()
            .map(|t| (t.field.clone(), t.term.clone()))
            .collect();
        for (field, term) in exact {
            for candidate in vocabulary.expand(&term, distance) {
                if candidate.to_lowercase() == term {
                    continue;
                }
                let key = (field.clone(), candidate.clone());
                if seen.contains_key(&key) {
                    continue;
                }
                seen.insert(key, tokens.len());
                tokens.push(QueryToken {
                    field: field.clone(),
                    term: candidate,
                    boost: FUZZY_EXPANSION_BOOST,
                });
            }
        }
    }

    Ok(tokens)
}

/// A decoded posting list as held by the term cache, with the chunk's
/// stored idf when one was persisted.
#[derive(Debug, Clone, Default)]
pub struct PostingListView {
    pub postings: Vec<TermPosting>,
    pub stored_idf: Option<f64>,
}

/// Interpret one decoded chunk value as a posting. String entries are
/// JSON-parsed; objects with a `docId` keep their frequency and metadata,
/// while raw numbers and strings become frequency-1 postings.
pub fn posting_from_chunk_value(value: ChunkValue) -> TermPosting {
    let text = match value {
        ChunkValue::Integer(n) => return TermPosting::new(n.to_string(), 1.0),
        ChunkValue::Text(text) => text,
    };

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(serde_json::Value::Object(map)) if map.contains_key("docId") => {
            let doc_id = match &map["docId"] {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            let term_frequency = map
                .get("termFrequency")
                .and_then(|v| v.as_f64())
                .filter(|f| f.is_finite() && *f > 0.0)
                .unwrap_or(1.0);
            let metadata = map
                .get("metadata")
                .and_then(|m| serde_json::from_value::<TermMetadata>(m.clone()).ok())
                .unwrap_or_default();
            TermPosting {
                doc_id,
                term_frequency,
                metadata,
            }
        }
        Ok(serde_json::Value::String(inner)) => TermPosting::new(inner, 1.0),
        Ok(serde_json::Value::Number(n)) => TermPosting::new(n.to_string(), 1.0),
        _ => TermPosting::new(text, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::pipeline::PipelineConfig;

    fn pipeline() -> Pipeline {
        Pipeline::from_config(&PipelineConfig::default()).unwrap()
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn deduplicates_field_term_pairs() {
        let mut vocabulary = Vocabulary::new();
        let tokens = build_query_tokens(
            "fox fox dog",
            &fields(&["title"]),
            &pipeline(),
            &mut vocabulary,
            None,
        )
        .unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|t| t.boost == 1.0));
    }

    #[test]
    fn fuzzy_expansion_adds_boosted_tokens() {
        let mut vocabulary = Vocabulary::new();
        vocabulary.insert("anthropic");

        let tokens = build_query_tokens(
            "anthopric",
            &fields(&["title"]),
            &pipeline(),
            &mut vocabulary,
            Some(2),
        )
        .unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].term, "anthopric");
        assert_eq!(tokens[0].boost, 1.0);
        assert_eq!(tokens[1].term, "anthropic");
        assert_eq!(tokens[1].boost, FUZZY_EXPANSION_BOOST);
    }

    #[test]
    fn expansion_never_displaces_exact_terms() {
        let mut vocabulary = Vocabulary::new();
        vocabulary.insert("fox");
        vocabulary.insert("box");

        let tokens = build_query_tokens(
            "fox box",
            &fields(&["title"]),
            &pipeline(),
            &mut vocabulary,
            Some(1),
        )
        .unwrap();

        for token in &tokens {
            if token.term == "fox" || token.term == "box" {
                assert_eq!(token.boost, 1.0);
            }
        }
    }

    #[test]
    fn object_entries_keep_frequency_and_metadata() {
        let entry = ChunkValue::Text(
            r#"{"docId":"doc-1","termFrequency":3,"metadata":{"isPrefix":true,"originalTerm":"fox"}}"#
                .to_string(),
        );
        let posting = posting_from_chunk_value(entry);
        assert_eq!(posting.doc_id, "doc-1");
        assert_eq!(posting.term_frequency, 3.0);
        assert!(posting.metadata.marks_prefix());
    }

    #[test]
    fn invalid_frequencies_default_to_one() {
        let entry = ChunkValue::Text(r#"{"docId":"doc-1","termFrequency":-5}"#.to_string());
        assert_eq!(posting_from_chunk_value(entry).term_frequency, 1.0);
    }

    #[test]
    fn raw_values_become_unit_postings() {
        assert_eq!(
            posting_from_chunk_value(ChunkValue::Integer(42)),
            TermPosting::new("42".to_string(), 1.0)
        );
        assert_eq!(
            posting_from_chunk_value(ChunkValue::Text("doc-1".to_string())),
            TermPosting::new("doc-1".to_string(), 1.0)
        );
        assert_eq!(
            posting_from_chunk_value(ChunkValue::Text("\"doc-2\"".to_string())),
            TermPosting::new("doc-2".to_string(), 1.0)
        );
    }
}
