use std::cmp::Ordering;

/// One ranked search result. `document` is filled only by detailed
/// searches that request stored payloads.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub document: Option<serde_json::Value>,
}

impl SearchHit {
    pub fn new(id: String, score: f64) -> Self {
        SearchHit {
            id,
            score,
            document: None,
        }
    }
}

/// Descending by score, with the canonical id as a stable tiebreak.
pub fn rank(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}
