use std::collections::HashSet;

use crate::analysis::stage::{PipelineStage, StageContext};
use crate::analysis::token::Token;
use crate::core::error::Result;

/// Drops tokens whose value is in the configured set. An empty set is a
/// no-op.
pub struct StopWordStage {
    pub stop_words: HashSet<String>,
}

impl StopWordStage {
    pub fn new(stop_words: HashSet<String>) -> Self {
        StopWordStage { stop_words }
    }
}

impl PipelineStage for StopWordStage {
    fn execute(&self, tokens: Vec<Token>, _context: &StageContext) -> Result<Vec<Token>> {
        if self.stop_words.is_empty() {
            return Ok(tokens);
        }
        Ok(tokens
            .into_iter()
            .filter(|token| !self.stop_words.contains(&token.value))
            .collect())
    }

    fn name(&self) -> &str {
        "stop_words"
    }
}
