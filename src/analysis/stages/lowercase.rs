use crate::analysis::stage::{PipelineStage, StageContext};
use crate::analysis::token::Token;
use crate::core::error::Result;

/// Lower-cases every token value.
pub struct LowercaseStage;

impl PipelineStage for LowercaseStage {
    fn execute(&self, tokens: Vec<Token>, _context: &StageContext) -> Result<Vec<Token>> {
        Ok(tokens
            .into_iter()
            .map(|mut token| {
                token.value = token.value.to_lowercase();
                token
            })
            .collect())
    }

    fn name(&self) -> &str {
        "lowercase"
    }
}
