use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::Encoding;
use crate::core::error::Result;

/// `metadata` store key used for the schema version tag.
pub const SCHEMA_VERSION_KEY: &str = "schema-version";
/// `cache_state` store key for the serialised document stats.
pub const DOCUMENT_STATS_KEY: &str = "document-stats";
/// `cache_state` store key for the serialised vocabulary.
pub const VOCABULARY_KEY: &str = "vocabulary";

/// Record in the `metadata` store; schema/version tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Record in the `terms` store: one persisted posting chunk, keyed by
/// `(field, term, chunk)`. This engine writes chunk 0 exclusively; the
/// chunk component exists so the key schema survives future chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermChunkRecord {
    pub field: String,
    pub term: String,
    pub chunk: u32,
    pub payload: Vec<u8>,
    pub doc_frequency: u32,
    #[serde(default)]
    pub inverse_document_frequency: Option<f64>,
    #[serde(default)]
    pub access_count: Option<u64>,
    #[serde(default)]
    pub last_accessed_at: Option<i64>,
    pub encoding: Encoding,
}

/// Record in the `vectors` store, keyed by `(field, doc_id)`. Reserved;
/// the engine currently writes none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorRecord {
    pub field: String,
    pub doc_id: String,
    pub vector: Vec<u8>,
    pub updated_at: DateTime<Utc>,
}

/// Record in the `documents` store: the caller's stored payload as JSON
/// text, round-tripped bytewise and never indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub doc_id: String,
    pub payload: String,
    pub updated_at: DateTime<Utc>,
}

/// Record in the `cache_state` store; the engine uses the
/// `document-stats` and `vocabulary` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStateRecord {
    pub key: String,
    pub payload: Vec<u8>,
    pub updated_at: DateTime<Utc>,
}

/// The persistence seam: five named object stores with transactional
/// put/get/delete, batch puts, and store-wide clears. The engine is the
/// sole writer for its configured database; adapters own the bytes at
/// rest. Batch puts are atomic: either every record lands or none does.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Open the database, idempotently creating missing stores. Opening
    /// at an older version than the stored schema fails with
    /// `AdapterUnavailable`.
    async fn open(&self, version: u32) -> Result<()>;

    async fn close(&self) -> Result<()>;

    async fn delete_database(&self) -> Result<()>;

    async fn put_metadata(&self, record: MetadataRecord) -> Result<()>;
    async fn get_metadata(&self, key: &str) -> Result<Option<MetadataRecord>>;
    async fn delete_metadata(&self, key: &str) -> Result<()>;

    async fn put_term_chunk(&self, record: TermChunkRecord) -> Result<()>;
    async fn get_term_chunk(
        &self,
        field: &str,
        term: &str,
        chunk: u32,
    ) -> Result<Option<TermChunkRecord>>;
    async fn delete_term_chunk(&self, field: &str, term: &str, chunk: u32) -> Result<()>;
    /// Many puts in a single transaction on the `terms` store.
    async fn put_term_chunks_batch(&self, records: Vec<TermChunkRecord>) -> Result<()>;

    async fn put_vector(&self, record: VectorRecord) -> Result<()>;
    async fn get_vector(&self, field: &str, doc_id: &str) -> Result<Option<VectorRecord>>;
    async fn delete_vector(&self, field: &str, doc_id: &str) -> Result<()>;

    async fn put_document(&self, record: DocumentRecord) -> Result<()>;
    async fn get_document(&self, doc_id: &str) -> Result<Option<DocumentRecord>>;
    async fn delete_document(&self, doc_id: &str) -> Result<()>;
    /// Many puts in a single transaction on the `documents` store.
    async fn put_documents_batch(&self, records: Vec<DocumentRecord>) -> Result<()>;

    async fn put_cache_state(&self, record: CacheStateRecord) -> Result<()>;
    async fn get_cache_state(&self, key: &str) -> Result<Option<CacheStateRecord>>;
    async fn delete_cache_state(&self, key: &str) -> Result<()>;

    /// Clear every store this adapter manages for the database.
    async fn clear_all(&self) -> Result<()>;
}
