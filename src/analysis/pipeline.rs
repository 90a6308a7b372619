use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::analysis::language::Language;
use crate::analysis::stage::{PipelineStage, StageContext};
use crate::analysis::stages::edge_ngram::{EdgeNGramStage, FieldNGramConfig};
use crate::analysis::stages::lowercase::LowercaseStage;
use crate::analysis::stages::stem::StemStage;
use crate::analysis::stages::stopword::StopWordStage;
use crate::analysis::stages::tokenize::TokenizeStage;
use crate::analysis::stemmer::Stemmer;
use crate::analysis::token::Token;
use crate::core::error::Result;
use crate::core::types::DocKey;

/// Analysis options. Language defaults feed the stop-word and stem stages
/// unless explicitly overridden.
#[derive(Clone, Default)]
pub struct PipelineConfig {
    pub language: Language,
    /// Replaces the language-selected list; an empty set disables
    /// filtering entirely.
    pub stop_words: Option<HashSet<String>>,
    pub enable_stemming: bool,
    /// Replaces the language-derived stemmer.
    pub stemmer: Option<Arc<dyn Stemmer>>,
    pub enable_edge_ngrams: bool,
    pub edge_ngram_min_length: Option<usize>,
    pub edge_ngram_max_length: Option<usize>,
    pub edge_ngram_field_config: Option<HashMap<String, FieldNGramConfig>>,
    /// Appended after the default stages.
    pub custom_stages: Vec<Arc<dyn PipelineStage>>,
}

pub const DEFAULT_EDGE_NGRAM_MIN: usize = 2;
pub const DEFAULT_EDGE_NGRAM_MAX: usize = 15;

/// Ordered stage sequence: tokenize, lowercase, stop words, then optional
/// stemming and edge n-grams, then any custom stages. A stage emitting no
/// tokens short-circuits the rest.
pub struct Pipeline {
    stages: Vec<Arc<dyn PipelineStage>>,
}

impl Pipeline {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::build(config, config.enable_edge_ngrams)
    }

    /// Query-side variant: n-grams are an index-time expansion, so they
    /// stay off here regardless of the index configuration.
    pub fn from_config_without_ngrams(config: &PipelineConfig) -> Result<Self> {
        Self::build(config, false)
    }

    fn build(config: &PipelineConfig, with_ngrams: bool) -> Result<Self> {
        let mut stages: Vec<Arc<dyn PipelineStage>> = Vec::new();
        stages.push(Arc::new(TokenizeStage::new()?));
        stages.push(Arc::new(LowercaseStage));

        let stop_words = config
            .stop_words
            .clone()
            .unwrap_or_else(|| config.language.stop_words());
        stages.push(Arc::new(StopWordStage::new(stop_words)));

        if config.enable_stemming || config.stemmer.is_some() {
            let stemmer = config
                .stemmer
                .clone()
                .unwrap_or_else(|| config.language.stemmer());
            stages.push(Arc::new(StemStage::new(stemmer)));
        }

        if with_ngrams {
            let min = config.edge_ngram_min_length.unwrap_or(DEFAULT_EDGE_NGRAM_MIN);
            let max = config.edge_ngram_max_length.unwrap_or(DEFAULT_EDGE_NGRAM_MAX);
            stages.push(Arc::new(EdgeNGramStage::new(
                min,
                max,
                config.edge_ngram_field_config.clone(),
            )));
        }

        for stage in &config.custom_stages {
            stages.push(stage.clone());
        }

        Ok(Pipeline { stages })
    }

    /// Run the full stage sequence over one field's raw text.
    pub fn run(&self, field: &str, document_id: Option<DocKey>, text: &str) -> Result<Vec<Token>> {
        let context = StageContext::new(field, document_id);
        let mut tokens = vec![Token::seed(text, field)];
        for stage in &self.stages {
            tokens = stage.execute(tokens, &context)?;
            if tokens.is_empty() {
                break;
            }
        }
        Ok(tokens)
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}
