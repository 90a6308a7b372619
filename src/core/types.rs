use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Document identifier. Integer and string ids share one key space:
/// persistence, snapshots and hash keys always use the canonical string
/// form, so `DocKey::Integer(1)` and `DocKey::Text("1")` name the same
/// document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocKey {
    Integer(u64),
    Text(String),
}

impl DocKey {
    /// Canonical string form used for hashing and persistence.
    pub fn canonical(&self) -> String {
        match self {
            DocKey::Integer(id) => id.to_string(),
            DocKey::Text(id) => id.clone(),
        }
    }
}

impl PartialEq for DocKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DocKey::Integer(a), DocKey::Integer(b)) => a == b,
            (DocKey::Text(a), DocKey::Text(b)) => a == b,
            (DocKey::Integer(a), DocKey::Text(b)) | (DocKey::Text(b), DocKey::Integer(a)) => {
                b.as_str() == a.to_string()
            }
        }
    }
}

impl Eq for DocKey {}

impl Hash for DocKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the canonical form so integer and string spellings collide
        match self {
            DocKey::Integer(id) => id.to_string().hash(state),
            DocKey::Text(id) => id.hash(state),
        }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DocKey::Integer(id) => write!(f, "{}", id),
            DocKey::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<u64> for DocKey {
    fn from(id: u64) -> Self {
        DocKey::Integer(id)
    }
}

impl From<&str> for DocKey {
    fn from(id: &str) -> Self {
        DocKey::Text(id.to_string())
    }
}

impl From<String> for DocKey {
    fn from(id: String) -> Self {
        DocKey::Text(id)
    }
}

/// Per-term metadata carried by tokens and postings. Edge n-gram
/// expansion fills both fields; other stages leave them unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_prefix: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_term: Option<String>,
}

impl TermMetadata {
    pub fn is_empty(&self) -> bool {
        self.is_prefix.is_none() && self.original_term.is_none()
    }

    /// True only when the metadata explicitly marks a prefix gram.
    pub fn marks_prefix(&self) -> bool {
        self.is_prefix == Some(true)
    }
}

/// One entry of a decoded posting list: a document, the term's frequency
/// in it, and optional prefix/fuzzy metadata. Doc ids are canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermPosting {
    pub doc_id: String,
    #[serde(default = "default_term_frequency")]
    pub term_frequency: f64,
    #[serde(default, skip_serializing_if = "TermMetadata::is_empty")]
    pub metadata: TermMetadata,
}

fn default_term_frequency() -> f64 {
    1.0
}

impl TermPosting {
    pub fn new(doc_id: String, term_frequency: f64) -> Self {
        TermPosting {
            doc_id,
            term_frequency,
            metadata: TermMetadata::default(),
        }
    }
}

/// A document handed to the engine: an id, field texts to index, and an
/// optional stored payload that is persisted but never indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
    pub id: DocKey,
    pub fields: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<serde_json::Value>,
}

impl DocumentInput {
    pub fn new(id: impl Into<DocKey>) -> Self {
        DocumentInput {
            id: id.into(),
            fields: HashMap::new(),
            store: None,
        }
    }

    pub fn field(mut self, name: &str, text: &str) -> Self {
        self.fields.insert(name.to_string(), text.to_string());
        self
    }

    pub fn store(mut self, payload: serde_json::Value) -> Self {
        self.store = Some(payload);
        self
    }
}
