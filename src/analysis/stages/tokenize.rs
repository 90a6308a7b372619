use regex::Regex;

use crate::analysis::stage::{PipelineStage, StageContext};
use crate::analysis::token::Token;
use crate::core::error::{Error, ErrorKind, Result};

/// Runs of Unicode letters and digits.
const TOKEN_PATTERN: &str = r"[\p{L}\p{N}]+";

/// Splits one seed token of raw text into word tokens. Each emitted token
/// carries the byte offset of its match as the position.
pub struct TokenizeStage {
    pattern: Regex,
}

impl TokenizeStage {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(TOKEN_PATTERN)
            .map_err(|e| Error::new(ErrorKind::Parse, format!("token pattern: {}", e)))?;
        Ok(TokenizeStage { pattern })
    }
}

impl PipelineStage for TokenizeStage {
    fn execute(&self, tokens: Vec<Token>, context: &StageContext) -> Result<Vec<Token>> {
        if tokens.len() != 1 {
            return Err(Error::new(
                ErrorKind::InvalidPipelineInput,
                format!("tokenize expects one seed token, got {}", tokens.len()),
            ));
        }

        let seed = &tokens[0];
        let mut output = Vec::new();
        for found in self.pattern.find_iter(&seed.value) {
            let mut token = Token::new(found.as_str().to_string(), found.start(), &context.field);
            token.document_id = context.document_id.clone();
            output.push(token);
        }
        Ok(output)
    }

    fn name(&self) -> &str {
        "tokenize"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Vec<Token> {
        let stage = TokenizeStage::new().unwrap();
        let context = StageContext::new("body", None);
        stage
            .execute(vec![Token::seed(text, "body")], &context)
            .unwrap()
    }

    #[test]
    fn splits_on_non_word_characters() {
        let tokens = run("Quick, brown fox!");
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["Quick", "brown", "fox"]);
    }

    #[test]
    fn positions_are_match_byte_offsets() {
        let tokens = run("ab cd");
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].position, 3);
    }

    #[test]
    fn keeps_unicode_words_and_digits() {
        let tokens = run("café 42 naïve");
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["café", "42", "naïve"]);
    }

    #[test]
    fn rejects_multiple_seed_tokens() {
        let stage = TokenizeStage::new().unwrap();
        let context = StageContext::new("body", None);
        let seeds = vec![Token::seed("a", "body"), Token::seed("b", "body")];
        let err = stage.execute(seeds, &context).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPipelineInput);
    }
}
