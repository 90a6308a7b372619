use std::collections::HashMap;

use crate::analysis::pipeline::Pipeline;
use crate::analysis::token::Token;
use crate::core::error::Result;
use crate::core::types::{DocKey, DocumentInput, TermMetadata};

/// Per-field tallies built up while a document's tokens stream through.
#[derive(Debug, Default)]
pub struct FieldAccumulator {
    pub term_frequencies: HashMap<String, u32>,
    pub term_metadata: HashMap<String, TermMetadata>,
    pub length: u32,
}

/// Collects one document's tokens into per-field frequencies, first-seen
/// term metadata, and field lengths. Empty token values are dropped.
#[derive(Debug, Default)]
pub struct DocumentAccumulator {
    fields: HashMap<String, FieldAccumulator>,
}

impl DocumentAccumulator {
    pub fn new() -> Self {
        DocumentAccumulator::default()
    }

    pub fn add_token(&mut self, token: &Token) {
        if token.value.is_empty() {
            return;
        }
        let field = self.fields.entry(token.field.clone()).or_default();
        *field
            .term_frequencies
            .entry(token.value.clone())
            .or_insert(0) += 1;
        field.length += 1;

        if let Some(metadata) = &token.metadata {
            // only the first metadata seen for a term is kept
            field
                .term_metadata
                .entry(token.value.clone())
                .or_insert_with(|| metadata.clone());
        }
    }

    pub fn finish(self, doc_id: DocKey) -> IngestedDocument {
        let mut field_frequencies = HashMap::new();
        let mut field_metadata = HashMap::new();
        let mut field_lengths = HashMap::new();
        let mut total_length = 0u32;

        for (field, accumulator) in self.fields {
            total_length += accumulator.length;
            field_lengths.insert(field.clone(), accumulator.length);
            field_metadata.insert(field.clone(), accumulator.term_metadata);
            field_frequencies.insert(field, accumulator.term_frequencies);
        }

        IngestedDocument {
            doc_id,
            field_frequencies,
            field_metadata,
            field_lengths,
            total_length,
        }
    }
}

/// The indexer's output for one document.
#[derive(Debug)]
pub struct IngestedDocument {
    pub doc_id: DocKey,
    pub field_frequencies: HashMap<String, HashMap<String, u32>>,
    pub field_metadata: HashMap<String, HashMap<String, TermMetadata>>,
    pub field_lengths: HashMap<String, u32>,
    pub total_length: u32,
}

/// Runs the pipeline over a document's fields and accumulates the result.
pub struct Indexer {
    pipeline: Pipeline,
}

impl Indexer {
    pub fn new(pipeline: Pipeline) -> Self {
        Indexer { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Tokenize and accumulate one document. Empty field values are
    /// skipped entirely.
    pub fn ingest(&self, record: &DocumentInput) -> Result<IngestedDocument> {
        let mut accumulator = DocumentAccumulator::new();
        for (field, text) in &record.fields {
            if text.is_empty() {
                continue;
            }
            let tokens = self.pipeline.run(field, Some(record.id.clone()), text)?;
            for token in &tokens {
                accumulator.add_token(token);
            }
        }
        Ok(accumulator.finish(record.id.clone()))
    }

    /// Batch variant with token caching: each distinct `(field, text)`
    /// pair across the batch is tokenized once. Tokenization is
    /// deterministic, so reuse is safe.
    pub fn ingest_batch(&self, records: &[DocumentInput]) -> Result<Vec<IngestedDocument>> {
        let mut token_cache: HashMap<(String, String), Vec<Token>> = HashMap::new();
        let mut output = Vec::with_capacity(records.len());

        for record in records {
            let mut accumulator = DocumentAccumulator::new();
            for (field, text) in &record.fields {
                if text.is_empty() {
                    continue;
                }
                let key = (field.clone(), text.clone());
                if !token_cache.contains_key(&key) {
                    let tokens = self.pipeline.run(field, None, text)?;
                    token_cache.insert(key.clone(), tokens);
                }
                if let Some(tokens) = token_cache.get(&key) {
                    for token in tokens {
                        accumulator.add_token(token);
                    }
                }
            }
            output.push(accumulator.finish(record.id.clone()));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::pipeline::PipelineConfig;

    fn indexer() -> Indexer {
        Indexer::new(Pipeline::from_config(&PipelineConfig::default()).unwrap())
    }

    #[test]
    fn ingest_counts_terms_per_field() {
        let record = DocumentInput::new("doc-1")
            .field("title", "Quick brown fox")
            .field("body", "fox fox dog");
        let ingested = indexer().ingest(&record).unwrap();

        assert_eq!(ingested.field_frequencies["title"]["quick"], 1);
        assert_eq!(ingested.field_frequencies["body"]["fox"], 2);
        assert_eq!(ingested.field_lengths["title"], 3);
        assert_eq!(ingested.field_lengths["body"], 3);
        assert_eq!(ingested.total_length, 6);
    }

    #[test]
    fn empty_fields_are_skipped() {
        let record = DocumentInput::new("doc-1")
            .field("title", "")
            .field("body", "fox");
        let ingested = indexer().ingest(&record).unwrap();
        assert!(!ingested.field_frequencies.contains_key("title"));
        assert_eq!(ingested.total_length, 1);
    }

    #[test]
    fn stop_word_only_document_has_zero_length() {
        let record = DocumentInput::new("doc-1").field("body", "the and of");
        let ingested = indexer().ingest(&record).unwrap();
        assert_eq!(ingested.total_length, 0);
    }

    #[test]
    fn batch_matches_single_ingest() {
        let records = vec![
            DocumentInput::new("a").field("body", "quick brown fox"),
            DocumentInput::new("b").field("body", "quick brown fox"),
            DocumentInput::new("c").field("body", "lazy dog"),
        ];
        let batched = indexer().ingest_batch(&records).unwrap();

        for (record, ingested) in records.iter().zip(&batched) {
            let single = indexer().ingest(record).unwrap();
            assert_eq!(single.field_frequencies, ingested.field_frequencies);
            assert_eq!(single.total_length, ingested.total_length);
        }
    }

    #[test]
    fn first_metadata_wins() {
        let mut accumulator = DocumentAccumulator::new();
        let mut first = Token::new("an".to_string(), 0, "title");
        first.metadata = Some(TermMetadata {
            is_prefix: Some(true),
            original_term: Some("anthropic".to_string()),
        });
        let mut second = Token::new("an".to_string(), 0, "title");
        second.metadata = Some(TermMetadata {
            is_prefix: Some(true),
            original_term: Some("antenna".to_string()),
        });
        accumulator.add_token(&first);
        accumulator.add_token(&second);

        let ingested = accumulator.finish(DocKey::from("doc-1"));
        assert_eq!(
            ingested.field_metadata["title"]["an"].original_term.as_deref(),
            Some("anthropic")
        );
        assert_eq!(ingested.field_frequencies["title"]["an"], 2);
    }
}
