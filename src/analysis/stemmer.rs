/// Stemming seam. Implementations must be pure: the indexer caches
/// tokenization per (field, text) pair during bulk ingest.
pub trait Stemmer: Send + Sync {
    fn stem(&self, value: &str) -> String;

    fn name(&self) -> &str;
}

/// Consonants eligible for the doubled-consonant collapse (runn -> run).
const DOUBLING_CONSONANTS: [char; 11] = ['b', 'd', 'f', 'g', 'l', 'm', 'n', 'p', 'r', 's', 't'];

/// Minimal English suffix stripper: removes `-ing`, `-ed` and plural `-s`
/// under length guards, then collapses a trailing doubled consonant left
/// behind by `-ing`/`-ed` stripping. Deliberately not a Porter stemmer.
pub struct EnglishStemmer;

impl EnglishStemmer {
    fn collapse_double(stem: &str) -> String {
        let chars: Vec<char> = stem.chars().collect();
        if chars.len() >= 2 {
            let last = chars[chars.len() - 1];
            if last == chars[chars.len() - 2] && DOUBLING_CONSONANTS.contains(&last) {
                return chars[..chars.len() - 1].iter().collect();
            }
        }
        stem.to_string()
    }
}

impl Stemmer for EnglishStemmer {
    fn stem(&self, value: &str) -> String {
        let length = value.chars().count();

        if length > 5 {
            if let Some(stem) = value.strip_suffix("ing") {
                return Self::collapse_double(stem);
            }
        }
        if length > 4 {
            if let Some(stem) = value.strip_suffix("ed") {
                return Self::collapse_double(stem);
            }
        }
        if length > 3 && !value.ends_with("ss") {
            if let Some(stem) = value.strip_suffix('s') {
                return stem.to_string();
            }
        }

        value.to_string()
    }

    fn name(&self) -> &str {
        "english"
    }
}

/// Identity stemmer for languages without stemming support.
pub struct PassthroughStemmer;

impl Stemmer for PassthroughStemmer {
    fn stem(&self, value: &str) -> String {
        value.to_string()
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ing_with_doubling_collapse() {
        let stemmer = EnglishStemmer;
        assert_eq!(stemmer.stem("running"), "run");
        assert_eq!(stemmer.stem("jumping"), "jump");
        assert_eq!(stemmer.stem("diving"), "div");
    }

    #[test]
    fn short_ing_words_are_untouched() {
        let stemmer = EnglishStemmer;
        assert_eq!(stemmer.stem("sing"), "sing");
        assert_eq!(stemmer.stem("bring"), "bring");
    }

    #[test]
    fn strips_ed() {
        let stemmer = EnglishStemmer;
        assert_eq!(stemmer.stem("jumped"), "jump");
        assert_eq!(stemmer.stem("stopped"), "stop");
        assert_eq!(stemmer.stem("used"), "used");
        assert_eq!(stemmer.stem("red"), "red");
    }

    #[test]
    fn strips_plural_s_but_not_ss() {
        let stemmer = EnglishStemmer;
        assert_eq!(stemmer.stem("dogs"), "dog");
        assert_eq!(stemmer.stem("glass"), "glass");
        assert_eq!(stemmer.stem("was"), "was");
    }

    #[test]
    fn passthrough_is_identity() {
        let stemmer = PassthroughStemmer;
        assert_eq!(stemmer.stem("corriendo"), "corriendo");
    }
}
