/// Multiplier applied to contributions from prefix-gram matches.
pub const PREFIX_MATCH_PENALTY: f64 = 0.7;

/// BM25+ style scorer. `delta` is the lower-bound shift that keeps long
/// documents from vanishing at high term frequencies.
pub struct Bm25Scorer {
    pub k1: f64,
    pub b: f64,
    pub delta: f64,
}

impl Default for Bm25Scorer {
    fn default() -> Self {
        Bm25Scorer {
            k1: 1.2,
            b: 0.75,
            delta: 0.5,
        }
    }
}

impl Bm25Scorer {
    /// Inverse document frequency: a stored value wins, otherwise
    /// `ln(1 + 1/df)`, and zero for an empty posting list.
    pub fn idf(&self, stored: Option<f64>, doc_frequency: u32) -> f64 {
        if let Some(value) = stored {
            return value;
        }
        if doc_frequency == 0 {
            0.0
        } else {
            (1.0 + 1.0 / doc_frequency as f64).ln()
        }
    }

    /// One posting's score contribution. `term_frequency` already carries
    /// any fuzzy boost; the prefix penalty is applied here.
    pub fn contribution(
        &self,
        idf: f64,
        term_frequency: f64,
        doc_length: f64,
        average_doc_length: f64,
        is_prefix: bool,
    ) -> f64 {
        let norm = 1.0 - self.b + self.b * doc_length / average_doc_length.max(1.0);
        let saturation = ((self.k1 + 1.0) * term_frequency) / (self.k1 * norm + term_frequency);
        let mut contribution = idf * (self.delta + saturation);
        if is_prefix {
            contribution *= PREFIX_MATCH_PENALTY;
        }
        contribution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idf_prefers_stored_value() {
        let scorer = Bm25Scorer::default();
        assert_eq!(scorer.idf(Some(3.5), 10), 3.5);
        assert!(scorer.idf(None, 1) > scorer.idf(None, 100));
        assert_eq!(scorer.idf(None, 0), 0.0);
    }

    #[test]
    fn higher_frequency_scores_higher_at_equal_length() {
        let scorer = Bm25Scorer::default();
        let idf = scorer.idf(None, 2);
        let low = scorer.contribution(idf, 1.0, 10.0, 10.0, false);
        let high = scorer.contribution(idf, 2.0, 10.0, 10.0, false);
        assert!(high >= low);
    }

    #[test]
    fn longer_documents_are_normalised_down() {
        let scorer = Bm25Scorer::default();
        let idf = scorer.idf(None, 2);
        let short = scorer.contribution(idf, 1.0, 5.0, 10.0, false);
        let long = scorer.contribution(idf, 1.0, 50.0, 10.0, false);
        assert!(short > long);
    }

    #[test]
    fn prefix_matches_are_penalised() {
        let scorer = Bm25Scorer::default();
        let idf = scorer.idf(None, 2);
        let exact = scorer.contribution(idf, 1.0, 10.0, 10.0, false);
        let prefix = scorer.contribution(idf, 1.0, 10.0, 10.0, true);
        assert!((prefix - exact * PREFIX_MATCH_PENALTY).abs() < 1e-12);
    }
}
