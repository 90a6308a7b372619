use std::collections::HashSet;
use std::sync::Arc;
use stop_words::{get, LANGUAGE};

use crate::analysis::stemmer::{EnglishStemmer, PassthroughStemmer, Stemmer};

/// Languages with bundled stop-word lists. English is the only one with a
/// stemmer; the others pass tokens through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
}

impl Language {
    /// Resolve a language code; unknown codes fall back to English.
    pub fn parse(code: &str) -> Self {
        match code.to_lowercase().as_str() {
            "en" | "english" => Language::English,
            "es" | "spanish" => Language::Spanish,
            "fr" | "french" => Language::French,
            _ => Language::English,
        }
    }

    pub fn stop_words(&self) -> HashSet<String> {
        let language = match self {
            Language::English => LANGUAGE::English,
            Language::Spanish => LANGUAGE::Spanish,
            Language::French => LANGUAGE::French,
        };
        get(language).into_iter().map(|w| w.to_lowercase()).collect()
    }

    pub fn stemmer(&self) -> Arc<dyn Stemmer> {
        match self {
            Language::English => Arc::new(EnglishStemmer),
            _ => Arc::new(PassthroughStemmer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_and_names() {
        assert_eq!(Language::parse("en"), Language::English);
        assert_eq!(Language::parse("English"), Language::English);
        assert_eq!(Language::parse("es"), Language::Spanish);
        assert_eq!(Language::parse("fr"), Language::French);
    }

    #[test]
    fn unknown_codes_fall_back_to_english() {
        let language = Language::parse("tlh");
        assert_eq!(language, Language::English);
        assert!(language.stop_words().contains("the"));
    }

    #[test]
    fn spanish_list_differs_from_english() {
        assert!(Language::Spanish.stop_words().contains("el"));
        assert!(!Language::English.stop_words().contains("el"));
    }
}
