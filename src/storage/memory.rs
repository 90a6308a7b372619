use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::adapter::{
    CacheStateRecord, DocumentRecord, MetadataRecord, StorageAdapter, TermChunkRecord,
    VectorRecord, SCHEMA_VERSION_KEY,
};

/// The five object stores as plain maps. Term chunks are keyed by the
/// compound `(field, term, chunk)`, vectors by `(field, doc_id)`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct StoreSet {
    pub metadata: HashMap<String, MetadataRecord>,
    pub terms: HashMap<(String, String, u32), TermChunkRecord>,
    pub vectors: HashMap<(String, String), VectorRecord>,
    pub documents: HashMap<String, DocumentRecord>,
    pub cache_state: HashMap<String, CacheStateRecord>,
}

impl StoreSet {
    pub fn clear(&mut self) {
        self.metadata.clear();
        self.terms.clear();
        self.vectors.clear();
        self.documents.clear();
        self.cache_state.clear();
    }
}

/// Checks and stamps the schema-version tag in a store set's metadata.
/// Shared by the in-memory and file-backed adapters.
pub(crate) fn verify_schema_version(stores: &mut StoreSet, version: u32) -> Result<()> {
    match stores.metadata.get(SCHEMA_VERSION_KEY) {
        Some(record) => {
            let stored: u32 = record.value.parse().map_err(|_| {
                Error::new(
                    ErrorKind::Parse,
                    format!("corrupt schema version tag: {}", record.value),
                )
            })?;
            if stored > version {
                return Err(Error::new(
                    ErrorKind::AdapterUnavailable,
                    format!("database schema v{} is newer than engine v{}", stored, version),
                ));
            }
        }
        None => {
            stores.metadata.insert(
                SCHEMA_VERSION_KEY.to_string(),
                MetadataRecord {
                    key: SCHEMA_VERSION_KEY.to_string(),
                    value: version.to_string(),
                    updated_at: Utc::now(),
                },
            );
        }
    }
    Ok(())
}

/// In-memory adapter: the reference implementation and primary test
/// double. Contents survive `close` but not process exit.
#[derive(Default)]
pub struct MemoryAdapter {
    stores: RwLock<StoreSet>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        MemoryAdapter::default()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    async fn open(&self, version: u32) -> Result<()> {
        verify_schema_version(&mut self.stores.write(), version)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn delete_database(&self) -> Result<()> {
        self.stores.write().clear();
        Ok(())
    }

    async fn put_metadata(&self, record: MetadataRecord) -> Result<()> {
        self.stores.write().metadata.insert(record.key.clone(), record);
        Ok(())
    }

    async fn get_metadata(&self, key: &str) -> Result<Option<MetadataRecord>> {
        Ok(self.stores.read().metadata.get(key).cloned())
    }

    async fn delete_metadata(&self, key: &str) -> Result<()> {
        self.stores.write().metadata.remove(key);
        Ok(())
    }

    async fn put_term_chunk(&self, record: TermChunkRecord) -> Result<()> {
        let key = (record.field.clone(), record.term.clone(), record.chunk);
        self.stores.write().terms.insert(key, record);
        Ok(())
    }

    async fn get_term_chunk(
        &self,
        field: &str,
        term: &str,
        chunk: u32,
    ) -> Result<Option<TermChunkRecord>> {
        let key = (field.to_string(), term.to_string(), chunk);
        Ok(self.stores.read().terms.get(&key).cloned())
    }

    async fn delete_term_chunk(&self, field: &str, term: &str, chunk: u32) -> Result<()> {
        let key = (field.to_string(), term.to_string(), chunk);
        self.stores.write().terms.remove(&key);
        Ok(())
    }

    async fn put_term_chunks_batch(&self, records: Vec<TermChunkRecord>) -> Result<()> {
        let mut stores = self.stores.write();
        for record in records {
            let key = (record.field.clone(), record.term.clone(), record.chunk);
            stores.terms.insert(key, record);
        }
        Ok(())
    }

    async fn put_vector(&self, record: VectorRecord) -> Result<()> {
        let key = (record.field.clone(), record.doc_id.clone());
        self.stores.write().vectors.insert(key, record);
        Ok(())
    }

    async fn get_vector(&self, field: &str, doc_id: &str) -> Result<Option<VectorRecord>> {
        let key = (field.to_string(), doc_id.to_string());
        Ok(self.stores.read().vectors.get(&key).cloned())
    }

    async fn delete_vector(&self, field: &str, doc_id: &str) -> Result<()> {
        let key = (field.to_string(), doc_id.to_string());
        self.stores.write().vectors.remove(&key);
        Ok(())
    }

    async fn put_document(&self, record: DocumentRecord) -> Result<()> {
        self.stores
            .write()
            .documents
            .insert(record.doc_id.clone(), record);
        Ok(())
    }

    async fn get_document(&self, doc_id: &str) -> Result<Option<DocumentRecord>> {
        Ok(self.stores.read().documents.get(doc_id).cloned())
    }

    async fn delete_document(&self, doc_id: &str) -> Result<()> {
        self.stores.write().documents.remove(doc_id);
        Ok(())
    }

    async fn put_documents_batch(&self, records: Vec<DocumentRecord>) -> Result<()> {
        let mut stores = self.stores.write();
        for record in records {
            stores.documents.insert(record.doc_id.clone(), record);
        }
        Ok(())
    }

    async fn put_cache_state(&self, record: CacheStateRecord) -> Result<()> {
        self.stores
            .write()
            .cache_state
            .insert(record.key.clone(), record);
        Ok(())
    }

    async fn get_cache_state(&self, key: &str) -> Result<Option<CacheStateRecord>> {
        Ok(self.stores.read().cache_state.get(key).cloned())
    }

    async fn delete_cache_state(&self, key: &str) -> Result<()> {
        self.stores.write().cache_state.remove(key);
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.stores.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encoding;

    fn chunk(field: &str, term: &str) -> TermChunkRecord {
        TermChunkRecord {
            field: field.to_string(),
            term: term.to_string(),
            chunk: 0,
            payload: vec![1, 2, 3],
            doc_frequency: 1,
            inverse_document_frequency: None,
            access_count: None,
            last_accessed_at: None,
            encoding: Encoding::Json,
        }
    }

    #[tokio::test]
    async fn batch_put_and_fetch() {
        let adapter = MemoryAdapter::new();
        adapter.open(1).await.unwrap();
        adapter
            .put_term_chunks_batch(vec![chunk("title", "fox"), chunk("body", "dog")])
            .await
            .unwrap();

        let found = adapter.get_term_chunk("title", "fox", 0).await.unwrap();
        assert!(found.is_some());
        assert!(adapter.get_term_chunk("title", "fox", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn open_rejects_newer_schema() {
        let adapter = MemoryAdapter::new();
        adapter.open(3).await.unwrap();
        let err = adapter.open(2).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AdapterUnavailable);
    }

    #[tokio::test]
    async fn clear_all_empties_every_store() {
        let adapter = MemoryAdapter::new();
        adapter.open(1).await.unwrap();
        adapter.put_term_chunk(chunk("title", "fox")).await.unwrap();
        adapter
            .put_document(DocumentRecord {
                doc_id: "1".to_string(),
                payload: "{}".to_string(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        adapter.clear_all().await.unwrap();
        assert!(adapter.get_term_chunk("title", "fox", 0).await.unwrap().is_none());
        assert!(adapter.get_document("1").await.unwrap().is_none());
    }
}
