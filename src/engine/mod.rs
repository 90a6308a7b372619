pub mod bulk;
pub mod snapshot;

use std::collections::HashMap;

use chrono::Utc;

use crate::analysis::pipeline::Pipeline;
use crate::cache::{BoundedCache, CacheStats};
use crate::codec::{self, ChunkValue};
use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::types::{DocKey, DocumentInput, TermPosting};
use crate::index::accumulator::{IngestedDocument, Indexer};
use crate::index::postings::{PostingEntry, PostingsStore};
use crate::index::stats::{DocLengthEntry, DocumentStats};
use crate::index::vocabulary::Vocabulary;
use crate::scoring::scorer::Bm25Scorer;
use crate::search::mode::{resolve_fuzzy_distance, resolve_mode};
use crate::search::query::{
    build_query_tokens, posting_from_chunk_value, PostingListView, SearchOptions,
};
use crate::search::results::{rank, SearchHit};
use crate::storage::adapter::{
    CacheStateRecord, DocumentRecord, StorageAdapter, TermChunkRecord, DOCUMENT_STATS_KEY,
    VOCABULARY_KEY,
};

/// Options for a single `add`.
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Persist dirty postings (and any stored payload) immediately;
    /// `false` defers both to the next `flush`.
    pub persist: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        AddOptions { persist: true }
    }
}

/// A point-in-time view of the engine's working state.
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub document_count: usize,
    pub average_document_length: f64,
    pub dirty_terms: usize,
    pub vocabulary_size: usize,
    pub term_cache: CacheStats,
}

/// The search engine facade: owns the in-memory postings, stats,
/// vocabulary and caches for its lifetime, and is the sole writer for its
/// adapter's database.
///
/// The engine is a single cooperative owner. It is not safe for
/// concurrent use from multiple threads; hand state across threads with
/// the snapshot operations instead.
pub struct SearchEngine<A: StorageAdapter> {
    config: EngineConfig,
    adapter: A,
    indexer: Indexer,
    query_pipeline: Pipeline,
    postings: PostingsStore,
    stats: DocumentStats,
    stats_dirty: bool,
    vocabulary: Vocabulary,
    term_cache: BoundedCache<PostingListView>,
    pending_documents: HashMap<String, serde_json::Value>,
    scorer: Bm25Scorer,
    opened: bool,
}

impl<A: StorageAdapter> SearchEngine<A> {
    pub fn new(config: EngineConfig, adapter: A) -> Result<Self> {
        let indexer = Indexer::new(Pipeline::from_config(&config.pipeline)?);
        let query_pipeline = Pipeline::from_config_without_ngrams(&config.pipeline)?;
        let term_cache = BoundedCache::new(config.cache.terms)?;

        Ok(SearchEngine {
            config,
            adapter,
            indexer,
            query_pipeline,
            postings: PostingsStore::new(),
            stats: DocumentStats::new(),
            stats_dirty: false,
            vocabulary: Vocabulary::new(),
            term_cache,
            pending_documents: HashMap::new(),
            scorer: Bm25Scorer::default(),
            opened: false,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            document_count: self.stats.document_count(),
            average_document_length: self.stats.average_length(),
            dirty_terms: self.postings.dirty_len(),
            vocabulary_size: self.vocabulary.len(),
            term_cache: self.term_cache.stats(),
        }
    }

    /// Open the database once and warm stats/vocabulary from the
    /// `cache_state` store. Later callers reuse the opened handle.
    pub(crate) async fn ensure_open(&mut self) -> Result<()> {
        if self.opened {
            return Ok(());
        }
        self.adapter.open(self.config.storage.version).await?;

        if let Some(record) = self.adapter.get_cache_state(DOCUMENT_STATS_KEY).await? {
            let entries: Vec<DocLengthEntry> = serde_json::from_slice(&record.payload)?;
            self.stats.load(entries);
        }
        if let Some(record) = self.adapter.get_cache_state(VOCABULARY_KEY).await? {
            let terms: Vec<String> = serde_json::from_slice(&record.payload)?;
            self.vocabulary.load(terms);
        }

        self.opened = true;
        tracing::debug!("opened index database {}", self.config.database_name());
        Ok(())
    }

    /// Index one document with immediate persistence.
    pub async fn add(&mut self, input: DocumentInput) -> Result<()> {
        self.add_with_options(input, &AddOptions::default()).await
    }

    /// Index one document. A document whose fields tokenize to nothing is
    /// a no-op.
    pub async fn add_with_options(
        &mut self,
        input: DocumentInput,
        options: &AddOptions,
    ) -> Result<()> {
        self.ensure_open().await?;

        let ingested = self.indexer.ingest(&input)?;
        if ingested.total_length == 0 {
            return Ok(());
        }

        let doc_key = input.id.canonical();
        let touched = self.apply_ingested(&doc_key, ingested);
        self.refresh_term_cache(&touched);

        if options.persist {
            self.persist_postings().await?;
        }

        if let Some(payload) = input.store {
            if options.persist {
                self.adapter
                    .put_document(DocumentRecord {
                        doc_id: doc_key.clone(),
                        payload: payload.to_string(),
                        updated_at: Utc::now(),
                    })
                    .await?;
            } else {
                self.pending_documents.insert(doc_key.clone(), payload);
            }
        }

        tracing::trace!("indexed document {}", doc_key);
        Ok(())
    }

    /// Upsert a document's postings and stats, growing the vocabulary
    /// with its non-prefix terms. Returns the `(field, term)` pairs
    /// touched.
    pub(crate) fn apply_ingested(
        &mut self,
        doc_key: &str,
        ingested: IngestedDocument,
    ) -> Vec<(String, String)> {
        self.stats.add_document(doc_key, ingested.total_length as u64);
        self.stats_dirty = true;

        let mut touched = Vec::new();
        for (field, frequencies) in &ingested.field_frequencies {
            let metadata_map = ingested.field_metadata.get(field);
            for (term, frequency) in frequencies {
                let metadata = metadata_map
                    .and_then(|terms| terms.get(term))
                    .cloned()
                    .unwrap_or_default();
                if !metadata.marks_prefix() {
                    self.vocabulary.insert(term);
                }
                self.postings.upsert(
                    field,
                    term,
                    doc_key,
                    PostingEntry {
                        frequency: *frequency as f64,
                        metadata,
                    },
                );
                touched.push((field.clone(), term.clone()));
            }
        }
        touched
    }

    /// Rebuild term-cache entries from the in-memory postings so freshly
    /// written terms are immediately queryable.
    pub(crate) fn refresh_term_cache(&mut self, pairs: &[(String, String)]) {
        for (field, term) in pairs {
            let view = self.view_from_memory(field, term);
            self.term_cache.set(format!("{}:{}", field, term), view);
        }
    }

    fn view_from_memory(&self, field: &str, term: &str) -> PostingListView {
        let postings = self
            .postings
            .get(field, term)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(doc_key, entry)| TermPosting {
                        doc_id: doc_key.clone(),
                        term_frequency: entry.frequency,
                        metadata: entry.metadata.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        PostingListView {
            postings,
            stored_idf: None,
        }
    }

    /// Walk the dirty set once, producing chunk writes for live terms and
    /// deletions for terms whose doc map emptied out. Emptied terms leave
    /// the in-memory map here.
    fn collect_posting_flush(&mut self) -> Result<(Vec<TermChunkRecord>, Vec<(String, String)>)> {
        let mut writes = Vec::new();
        let mut deletions = Vec::new();

        for (field, term) in self.postings.dirty_pairs() {
            match self.postings.get(&field, &term) {
                Some(documents) if !documents.is_empty() => {
                    let mut values = Vec::with_capacity(documents.len());
                    for (doc_key, entry) in documents {
                        let posting = TermPosting {
                            doc_id: doc_key.clone(),
                            term_frequency: entry.frequency,
                            metadata: entry.metadata.clone(),
                        };
                        values.push(ChunkValue::Text(serde_json::to_string(&posting)?));
                    }
                    let doc_frequency = values.len() as u32;
                    let (payload, encoding) = codec::encode(&values)?;
                    writes.push(TermChunkRecord {
                        field,
                        term,
                        chunk: 0,
                        payload,
                        doc_frequency,
                        inverse_document_frequency: None,
                        access_count: None,
                        last_accessed_at: None,
                        encoding,
                    });
                }
                _ => {
                    self.postings.remove_term(&field, &term);
                    deletions.push((field, term));
                }
            }
        }

        Ok((writes, deletions))
    }

    async fn write_posting_flush(
        adapter: &A,
        writes: Vec<TermChunkRecord>,
        deletions: Vec<(String, String)>,
    ) -> Result<()> {
        let deletes = deletions
            .iter()
            .map(|(field, term)| adapter.delete_term_chunk(field, term, 0));
        futures::future::try_join_all(deletes).await?;

        if !writes.is_empty() {
            adapter.put_term_chunks_batch(writes).await?;
        }
        Ok(())
    }

    async fn write_documents(adapter: &A, records: Vec<DocumentRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        adapter.put_documents_batch(records).await
    }

    async fn write_cache_blob(adapter: &A, key: &str, payload: Option<Vec<u8>>) -> Result<()> {
        match payload {
            None => Ok(()),
            Some(payload) => {
                adapter
                    .put_cache_state(CacheStateRecord {
                        key: key.to_string(),
                        payload,
                        updated_at: Utc::now(),
                    })
                    .await
            }
        }
    }

    /// Encode and write every dirty posting list, then clear the dirty
    /// set. Deletions run in parallel; writes land in one batch put.
    pub(crate) async fn persist_postings(&mut self) -> Result<()> {
        let (writes, deletions) = self.collect_posting_flush()?;
        Self::write_posting_flush(&self.adapter, writes, deletions).await?;
        self.postings.clear_dirty();
        Ok(())
    }

    /// Drain all dirty state. The four sub-operations target disjoint
    /// object stores and run concurrently; each one's dirty flag clears
    /// only if its own writes succeeded, so a failed store retries on the
    /// next flush.
    pub async fn flush(&mut self) -> Result<()> {
        self.ensure_open().await?;

        let (writes, deletions) = self.collect_posting_flush()?;
        let documents: Vec<DocumentRecord> = self
            .pending_documents
            .iter()
            .map(|(doc_id, payload)| DocumentRecord {
                doc_id: doc_id.clone(),
                payload: payload.to_string(),
                updated_at: Utc::now(),
            })
            .collect();
        let stats_blob = if self.stats_dirty {
            Some(serde_json::to_vec(&self.stats.snapshot())?)
        } else {
            None
        };
        let vocabulary_blob = if self.vocabulary.is_dirty() {
            Some(serde_json::to_vec(&self.vocabulary.snapshot())?)
        } else {
            None
        };

        let adapter = &self.adapter;
        let (terms_result, documents_result, stats_result, vocabulary_result) = futures::join!(
            Self::write_posting_flush(adapter, writes, deletions),
            Self::write_documents(adapter, documents),
            Self::write_cache_blob(adapter, DOCUMENT_STATS_KEY, stats_blob),
            Self::write_cache_blob(adapter, VOCABULARY_KEY, vocabulary_blob),
        );

        if terms_result.is_ok() {
            self.postings.clear_dirty();
        }
        if documents_result.is_ok() {
            self.pending_documents.clear();
        }
        if stats_result.is_ok() {
            self.stats_dirty = false;
        }
        if vocabulary_result.is_ok() {
            self.vocabulary.mark_clean();
        }

        terms_result?;
        documents_result?;
        stats_result?;
        vocabulary_result?;

        tracing::debug!("flush complete");
        Ok(())
    }

    /// Ranked document ids for a query.
    pub async fn search(&mut self, query: &str, options: &SearchOptions) -> Result<Vec<String>> {
        let hits = self.search_detailed(query, options).await?;
        Ok(hits.into_iter().map(|hit| hit.id).collect())
    }

    /// Ranked hits with scores, optionally joined with stored payloads.
    pub async fn search_detailed(
        &mut self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        self.ensure_open().await?;

        let mode = resolve_mode(options.mode, query);
        let fuzzy_distance = resolve_fuzzy_distance(mode, options.fuzzy);
        let fields = options
            .fields
            .clone()
            .unwrap_or_else(|| self.config.fields.clone());
        let pipeline = if options.apply_query_ngrams {
            self.indexer.pipeline()
        } else {
            &self.query_pipeline
        };

        let tokens =
            build_query_tokens(query, &fields, pipeline, &mut self.vocabulary, fuzzy_distance)?;

        let average_length = self.stats.average_length();
        let mut scores: HashMap<String, f64> = HashMap::new();

        for token in &tokens {
            let view = match self.fetch_postings(&token.field, &token.term).await? {
                Some(view) => view,
                None => continue,
            };
            let idf = self
                .scorer
                .idf(view.stored_idf, view.postings.len() as u32);

            for posting in &view.postings {
                let doc_length = self
                    .stats
                    .get(&posting.doc_id)
                    .map(|length| length as f64)
                    .unwrap_or(average_length);
                let term_frequency = posting.term_frequency * token.boost;
                let contribution = self.scorer.contribution(
                    idf,
                    term_frequency,
                    doc_length,
                    average_length,
                    posting.metadata.marks_prefix(),
                );
                *scores.entry(posting.doc_id.clone()).or_insert(0.0) += contribution;
            }
        }

        let mut hits: Vec<SearchHit> = scores
            .into_iter()
            .map(|(id, score)| SearchHit::new(id, score))
            .collect();
        if options.min_score > 0.0 {
            hits.retain(|hit| hit.score >= options.min_score);
        }
        rank(&mut hits);
        hits.truncate(options.limit.max(1));

        if options.include_stored {
            for hit in &mut hits {
                let key = DocKey::Text(hit.id.clone());
                hit.document = self.get_document(&key).await?;
            }
        }

        Ok(hits)
    }

    /// Resolve one query token's posting list: term cache first, then the
    /// in-memory postings, then the terms store. A chunk loaded from
    /// storage is materialised into the in-memory postings (so a later
    /// `remove` can edit it) and cached. An absent chunk contributes
    /// nothing.
    async fn fetch_postings(&mut self, field: &str, term: &str) -> Result<Option<PostingListView>> {
        let cache_key = format!("{}:{}", field, term);
        if let Some(view) = self.term_cache.get(&cache_key) {
            return Ok(Some(view.clone()));
        }

        if self.postings.get(field, term).is_some() {
            let view = self.view_from_memory(field, term);
            self.term_cache.set(cache_key, view.clone());
            return Ok(Some(view));
        }

        let chunk = match self.adapter.get_term_chunk(field, term, 0).await? {
            Some(chunk) => chunk,
            None => return Ok(None),
        };

        let values = codec::decode(&chunk.payload, chunk.encoding)?;
        let view = PostingListView {
            postings: values.into_iter().map(posting_from_chunk_value).collect(),
            stored_idf: chunk.inverse_document_frequency,
        };
        for posting in &view.postings {
            self.postings.insert_clean(
                field,
                term,
                &posting.doc_id,
                PostingEntry {
                    frequency: posting.term_frequency,
                    metadata: posting.metadata.clone(),
                },
            );
        }
        self.term_cache.set(cache_key, view.clone());
        Ok(Some(view))
    }

    /// Remove a document from every posting list loaded this session and
    /// persist the edits. Terms that only live in storage (never touched
    /// since open) keep their persisted postings; callers needing strict
    /// removal must warm the document's terms first, e.g. by re-running
    /// its fields through the pipeline and querying each term.
    pub async fn remove(&mut self, doc_id: &DocKey) -> Result<()> {
        self.ensure_open().await?;
        let doc_key = doc_id.canonical();

        let affected = self.postings.remove_document(&doc_key);
        self.persist_postings().await?;
        // stale cached lists must not outlive the edit
        self.term_cache.clear();

        self.stats.remove_document(&doc_key);
        self.stats_dirty = true;
        self.pending_documents.remove(&doc_key);
        self.adapter.delete_document(&doc_key).await?;

        tracing::debug!("removed document {} ({} terms touched)", doc_key, affected.len());
        Ok(())
    }

    /// Fetch a stored payload, preferring queued writes over storage.
    pub async fn get_document(&mut self, doc_id: &DocKey) -> Result<Option<serde_json::Value>> {
        self.ensure_open().await?;
        let doc_key = doc_id.canonical();

        if let Some(payload) = self.pending_documents.get(&doc_key) {
            return Ok(Some(payload.clone()));
        }
        match self.adapter.get_document(&doc_key).await? {
            Some(record) => Ok(Some(serde_json::from_str(&record.payload)?)),
            None => Ok(None),
        }
    }

    /// Drop all in-memory state and clear every object store.
    pub async fn clear(&mut self) -> Result<()> {
        self.ensure_open().await?;
        self.reset_memory();
        self.adapter.clear_all().await
    }

    /// Drop all state and delete the underlying database.
    pub async fn destroy(&mut self) -> Result<()> {
        self.reset_memory();
        self.adapter.delete_database().await?;
        self.opened = false;
        Ok(())
    }

    pub(crate) fn reset_memory(&mut self) {
        self.postings.clear();
        self.stats.clear();
        self.stats_dirty = false;
        self.vocabulary.clear();
        self.term_cache.clear();
        self.pending_documents.clear();
    }
}
