use std::sync::Arc;

use crate::analysis::stage::{PipelineStage, StageContext};
use crate::analysis::stemmer::Stemmer;
use crate::analysis::token::Token;
use crate::core::error::Result;

/// Applies the configured stemmer to every token value.
pub struct StemStage {
    stemmer: Arc<dyn Stemmer>,
}

impl StemStage {
    pub fn new(stemmer: Arc<dyn Stemmer>) -> Self {
        StemStage { stemmer }
    }
}

impl PipelineStage for StemStage {
    fn execute(&self, tokens: Vec<Token>, _context: &StageContext) -> Result<Vec<Token>> {
        Ok(tokens
            .into_iter()
            .map(|mut token| {
                token.value = self.stemmer.stem(&token.value);
                token
            })
            .collect())
    }

    fn name(&self) -> &str {
        "stem"
    }
}
