use crate::analysis::pipeline::PipelineConfig;

/// Engine construction options.
#[derive(Clone)]
pub struct EngineConfig {
    pub name: String,
    pub fields: Vec<String>,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
}

impl EngineConfig {
    pub fn new(name: &str, fields: &[&str]) -> Self {
        EngineConfig {
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            pipeline: PipelineConfig::default(),
            storage: StorageConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Database name the adapter should open; falls back to the index name.
    pub fn database_name(&self) -> &str {
        self.storage.db_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub db_name: Option<String>,
    pub version: u32,
    pub chunk_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            db_name: None,
            version: 1,
            chunk_size: 256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub terms: usize,   // posting-list entries kept hot
    pub vectors: usize, // reserved for the vectors store
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            terms: 2048,
            vectors: 512,
        }
    }
}
