use std::collections::HashMap;

use crate::analysis::stage::{PipelineStage, StageContext};
use crate::analysis::token::Token;
use crate::core::error::Result;
use crate::core::types::TermMetadata;

/// Per-field edge n-gram override. Only listed fields with `enabled`
/// generate grams when a field config is present.
#[derive(Debug, Clone)]
pub struct FieldNGramConfig {
    pub enabled: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

/// Expands each token into its leading prefixes of char-lengths
/// `min_gram ..= min(len, max_gram)`. Every emitted gram carries
/// `{is_prefix, original_term}` metadata; only the full-length gram has
/// `is_prefix = false`. Tokens shorter than `min_gram` pass through
/// unchanged and gain no metadata.
pub struct EdgeNGramStage {
    min_gram: usize,
    max_gram: usize,
    field_config: Option<HashMap<String, FieldNGramConfig>>,
}

impl EdgeNGramStage {
    pub fn new(
        min_gram: usize,
        max_gram: usize,
        field_config: Option<HashMap<String, FieldNGramConfig>>,
    ) -> Self {
        EdgeNGramStage {
            min_gram: min_gram.max(1),
            max_gram: max_gram.max(min_gram.max(1)),
            field_config,
        }
    }

    /// Effective (min, max) for the field, or None when the field is
    /// excluded by the per-field config.
    fn grams_for_field(&self, field: &str) -> Option<(usize, usize)> {
        match &self.field_config {
            None => Some((self.min_gram, self.max_gram)),
            Some(config) => {
                let field_config = config.get(field)?;
                if !field_config.enabled {
                    return None;
                }
                let min = field_config.min_length.unwrap_or(self.min_gram).max(1);
                let max = field_config.max_length.unwrap_or(self.max_gram).max(min);
                Some((min, max))
            }
        }
    }

    fn expand(token: &Token, min: usize, max: usize, output: &mut Vec<Token>) {
        let chars: Vec<char> = token.value.chars().collect();
        let length = chars.len();
        if length < min {
            output.push(token.clone());
            return;
        }

        for n in min..=max.min(length) {
            let mut gram = token.clone();
            gram.value = chars[..n].iter().collect();
            gram.metadata = Some(TermMetadata {
                is_prefix: Some(n < length),
                original_term: Some(token.value.clone()),
            });
            output.push(gram);
        }
    }
}

impl PipelineStage for EdgeNGramStage {
    fn execute(&self, tokens: Vec<Token>, context: &StageContext) -> Result<Vec<Token>> {
        let (min, max) = match self.grams_for_field(&context.field) {
            Some(range) => range,
            None => return Ok(tokens),
        };

        let mut output = Vec::with_capacity(tokens.len());
        for token in &tokens {
            Self::expand(token, min, max, &mut output);
        }
        Ok(output)
    }

    fn name(&self) -> &str {
        "edge_ngram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn expands_token_into_prefixes() {
        let stage = EdgeNGramStage::new(2, 15, None);
        let context = StageContext::new("title", None);
        let tokens = stage
            .execute(vec![Token::new("anthropic".to_string(), 0, "title")], &context)
            .unwrap();

        assert_eq!(
            values(&tokens),
            vec!["an", "ant", "anth", "anthr", "anthro", "anthrop", "anthropi", "anthropic"]
        );

        for token in &tokens[..tokens.len() - 1] {
            let metadata = token.metadata.as_ref().unwrap();
            assert_eq!(metadata.is_prefix, Some(true));
            assert_eq!(metadata.original_term.as_deref(), Some("anthropic"));
        }
        let last = tokens.last().unwrap().metadata.as_ref().unwrap();
        assert_eq!(last.is_prefix, Some(false));
    }

    #[test]
    fn short_tokens_pass_through_without_metadata() {
        let stage = EdgeNGramStage::new(3, 15, None);
        let context = StageContext::new("title", None);
        let tokens = stage
            .execute(vec![Token::new("ab".to_string(), 0, "title")], &context)
            .unwrap();
        assert_eq!(values(&tokens), vec!["ab"]);
        assert!(tokens[0].metadata.is_none());
    }

    #[test]
    fn field_config_limits_expansion_to_enabled_fields() {
        let mut config = HashMap::new();
        config.insert(
            "title".to_string(),
            FieldNGramConfig {
                enabled: true,
                min_length: Some(2),
                max_length: Some(3),
            },
        );
        let stage = EdgeNGramStage::new(2, 15, Some(config));

        let title_context = StageContext::new("title", None);
        let title = stage
            .execute(vec![Token::new("fox".to_string(), 0, "title")], &title_context)
            .unwrap();
        assert_eq!(values(&title), vec!["fo", "fox"]);

        let body_context = StageContext::new("body", None);
        let body = stage
            .execute(vec![Token::new("fox".to_string(), 0, "body")], &body_context)
            .unwrap();
        assert_eq!(values(&body), vec!["fox"]);
        assert!(body[0].metadata.is_none());
    }

    #[test]
    fn max_is_raised_to_min() {
        let stage = EdgeNGramStage::new(4, 2, None);
        let context = StageContext::new("title", None);
        let tokens = stage
            .execute(vec![Token::new("search".to_string(), 0, "title")], &context)
            .unwrap();
        assert_eq!(values(&tokens), vec!["sear"]);
    }
}
