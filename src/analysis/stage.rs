use crate::analysis::token::Token;
use crate::core::error::Result;
use crate::core::types::DocKey;

/// Field and document context plumbed through every stage.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub field: String,
    pub document_id: Option<DocKey>,
}

impl StageContext {
    pub fn new(field: &str, document_id: Option<DocKey>) -> Self {
        StageContext {
            field: field.to_string(),
            document_id,
        }
    }
}

/// One step of the analysis pipeline. Stages consume the previous stage's
/// tokens and emit a new list; returning an empty list short-circuits the
/// rest of the pipeline.
pub trait PipelineStage: Send + Sync {
    fn execute(&self, tokens: Vec<Token>, context: &StageContext) -> Result<Vec<Token>>;

    fn name(&self) -> &str;
}
