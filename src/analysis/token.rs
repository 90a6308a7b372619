use crate::core::types::{DocKey, TermMetadata};

/// A unit of text flowing through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: String,
    pub position: usize, // byte offset of the match in the source text
    pub field: String,
    pub document_id: Option<DocKey>,
    pub metadata: Option<TermMetadata>,
}

impl Token {
    pub fn new(value: String, position: usize, field: &str) -> Self {
        Token {
            value,
            position,
            field: field.to_string(),
            document_id: None,
            metadata: None,
        }
    }

    /// The single raw-text token the tokenize stage consumes.
    pub fn seed(text: &str, field: &str) -> Self {
        Token::new(text.to_string(), 0, field)
    }
}
