use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::Result;
use crate::storage::adapter::{
    CacheStateRecord, DocumentRecord, MetadataRecord, StorageAdapter, TermChunkRecord,
    VectorRecord,
};
use crate::storage::memory::{verify_schema_version, StoreSet};

const METADATA_FILE: &str = "metadata.bin";
const TERMS_FILE: &str = "terms.bin";
const VECTORS_FILE: &str = "vectors.bin";
const DOCUMENTS_FILE: &str = "documents.bin";
const CACHE_STATE_FILE: &str = "cache_state.bin";

/// File-backed adapter: each object store is one bincode image under the
/// root directory, loaded on `open` and rewritten after mutations. Batches
/// apply fully in memory before the single image rewrite, so a batch is
/// all-or-nothing on disk.
pub struct FileAdapter {
    root: PathBuf,
    stores: RwLock<StoreSet>,
}

impl FileAdapter {
    pub fn new(root: impl AsRef<Path>) -> Self {
        FileAdapter {
            root: root.as_ref().to_path_buf(),
            stores: RwLock::new(StoreSet::default()),
        }
    }

    fn load_store<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T> {
        let path = self.root.join(file);
        if !path.exists() {
            return Ok(T::default());
        }
        let data = fs::read(path)?;
        Ok(bincode::deserialize(&data)?)
    }

    fn save_store<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let data = bincode::serialize(value)?;
        fs::write(self.root.join(file), data)?;
        Ok(())
    }

    fn save_metadata(&self, stores: &StoreSet) -> Result<()> {
        self.save_store(METADATA_FILE, &stores.metadata)
    }

    fn save_terms(&self, stores: &StoreSet) -> Result<()> {
        self.save_store(TERMS_FILE, &stores.terms)
    }

    fn save_vectors(&self, stores: &StoreSet) -> Result<()> {
        self.save_store(VECTORS_FILE, &stores.vectors)
    }

    fn save_documents(&self, stores: &StoreSet) -> Result<()> {
        self.save_store(DOCUMENTS_FILE, &stores.documents)
    }

    fn save_cache_state(&self, stores: &StoreSet) -> Result<()> {
        self.save_store(CACHE_STATE_FILE, &stores.cache_state)
    }
}

#[async_trait]
impl StorageAdapter for FileAdapter {
    async fn open(&self, version: u32) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let mut stores = self.stores.write();
        stores.metadata = self.load_store(METADATA_FILE)?;
        stores.terms = self.load_store(TERMS_FILE)?;
        stores.vectors = self.load_store(VECTORS_FILE)?;
        stores.documents = self.load_store(DOCUMENTS_FILE)?;
        stores.cache_state = self.load_store(CACHE_STATE_FILE)?;

        verify_schema_version(&mut stores, version)?;
        self.save_metadata(&stores)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn delete_database(&self) -> Result<()> {
        self.stores.write().clear();
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }

    async fn put_metadata(&self, record: MetadataRecord) -> Result<()> {
        let mut stores = self.stores.write();
        stores.metadata.insert(record.key.clone(), record);
        self.save_metadata(&stores)
    }

    async fn get_metadata(&self, key: &str) -> Result<Option<MetadataRecord>> {
        Ok(self.stores.read().metadata.get(key).cloned())
    }

    async fn delete_metadata(&self, key: &str) -> Result<()> {
        let mut stores = self.stores.write();
        stores.metadata.remove(key);
        self.save_metadata(&stores)
    }

    async fn put_term_chunk(&self, record: TermChunkRecord) -> Result<()> {
        let mut stores = self.stores.write();
        let key = (record.field.clone(), record.term.clone(), record.chunk);
        stores.terms.insert(key, record);
        self.save_terms(&stores)
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
        let mut stores = self.stores.write();
        let key = (field.to_string(), term.to_string(), chunk);
        stores.terms.remove(&key);
        self.save_terms(&stores)
    }

    async fn put_term_chunks_batch(&self, records: Vec<TermChunkRecord>) -> Result<()> {
        let mut stores = self.stores.write();
        for record in records {
            let key = (record.field.clone(), record.term.clone(), record.chunk);
            stores.terms.insert(key, record);
        }
        self.save_terms(&stores)
    }

    async fn put_vector(&self, record: VectorRecord) -> Result<()> {
        let mut stores = self.stores.write();
        let key = (record.field.clone(), record.doc_id.clone());
        stores.vectors.insert(key, record);
        self.save_vectors(&stores)
    }

    async fn get_vector(&self, field: &str, doc_id: &str) -> Result<Option<VectorRecord>> {
        let key = (field.to_string(), doc_id.to_string());
        Ok(self.stores.read().vectors.get(&key).cloned())
    }

    async fn delete_vector(&self, field: &str, doc_id: &str) -> Result<()> {
        let mut stores = self.stores.write();
        let key = (field.to_string(), doc_id.to_string());
        stores.vectors.remove(&key);
        self.save_vectors(&stores)
    }

    async fn put_document(&self, record: DocumentRecord) -> Result<()> {
        let mut stores = self.stores.write();
        stores.documents.insert(record.doc_id.clone(), record);
        self.save_documents(&stores)
    }

    async fn get_document(&self, doc_id: &str) -> Result<Option<DocumentRecord>> {
        Ok(self.stores.read().documents.get(doc_id).cloned())
    }

    async fn delete_document(&self, doc_id: &str) -> Result<()> {
        let mut stores = self.stores.write();
        stores.documents.remove(doc_id);
        self.save_documents(&stores)
    }

    async fn put_documents_batch(&self, records: Vec<DocumentRecord>) -> Result<()> {
        let mut stores = self.stores.write();
        for record in records {
            stores.documents.insert(record.doc_id.clone(), record);
        }
        self.save_documents(&stores)
    }

    async fn put_cache_state(&self, record: CacheStateRecord) -> Result<()> {
        let mut stores = self.stores.write();
        stores.cache_state.insert(record.key.clone(), record);
        self.save_cache_state(&stores)
    }

    async fn get_cache_state(&self, key: &str) -> Result<Option<CacheStateRecord>> {
        Ok(self.stores.read().cache_state.get(key).cloned())
    }

    async fn delete_cache_state(&self, key: &str) -> Result<()> {
        let mut stores = self.stores.write();
        stores.cache_state.remove(key);
        self.save_cache_state(&stores)
    }

    async fn clear_all(&self) -> Result<()> {
        let mut stores = self.stores.write();
        stores.clear();
        self.save_metadata(&stores)?;
        self.save_terms(&stores)?;
        self.save_vectors(&stores)?;
        self.save_documents(&stores)?;
        self.save_cache_state(&stores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn contents_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index");

        let adapter = FileAdapter::new(&path);
        adapter.open(1).await.unwrap();
        adapter
            .put_document(DocumentRecord {
                doc_id: "doc-1".to_string(),
                payload: r#"{"title":"fox"}"#.to_string(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        adapter.close().await.unwrap();
        drop(adapter);

        let reopened = FileAdapter::new(&path);
        reopened.open(1).await.unwrap();
        let record = reopened.get_document("doc-1").await.unwrap().unwrap();
        assert_eq!(record.payload, r#"{"title":"fox"}"#);
    }

    #[tokio::test]
    async fn delete_database_removes_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index");

        let adapter = FileAdapter::new(&path);
        adapter.open(1).await.unwrap();
        assert!(path.exists());

        adapter.delete_database().await.unwrap();
        assert!(!path.exists());
    }
}
