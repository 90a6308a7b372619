use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::core::error::Result;
use crate::core::types::DocumentInput;
use crate::engine::SearchEngine;
use crate::index::accumulator::IngestedDocument;
use crate::storage::adapter::StorageAdapter;

/// Minimum wall-clock gap between throttled progress callbacks.
const PROGRESS_THROTTLE: Duration = Duration::from_millis(100);

pub type ProgressCallback = Box<dyn FnMut(&BulkProgress) + Send>;
pub type CheckpointCallback = Box<dyn FnMut(&BulkCheckpoint) + Send>;

#[derive(Debug, Clone, Copy)]
pub struct BulkProgress {
    pub processed: usize,
    pub total: usize,
}

/// Bulk ingestion options. Fixed batches use `batch_size`; adaptive mode
/// re-estimates each batch from rough per-document byte sizes and caps it
/// at `max_memory_mb`, inside `[min_batch_size, max_batch_size]`.
pub struct BulkOptions {
    pub batch_size: usize,
    pub adaptive: bool,
    pub max_memory_mb: usize,
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    pub on_progress: Option<ProgressCallback>,
    /// Stream progress per document (every `progress_interval`) instead
    /// of throttled per-batch reports.
    pub stream_progress: bool,
    pub progress_interval: usize,
}

impl Default for BulkOptions {
    fn default() -> Self {
        BulkOptions {
            batch_size: 100,
            adaptive: false,
            max_memory_mb: 64,
            min_batch_size: 10,
            max_batch_size: 1000,
            on_progress: None,
            stream_progress: false,
            progress_interval: 100,
        }
    }
}

/// Recovery options for `add_bulk_with_recovery`.
pub struct RecoveryOptions {
    pub bulk: BulkOptions,
    /// Keep going past failed documents, collecting them in the
    /// checkpoint. When false the first failure ends the run.
    pub continue_on_error: bool,
    pub enable_checkpointing: bool,
    /// Processed-document count between checkpoint flushes.
    pub checkpoint_interval: usize,
    pub on_checkpoint: Option<CheckpointCallback>,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        RecoveryOptions {
            bulk: BulkOptions::default(),
            continue_on_error: true,
            enable_checkpointing: false,
            checkpoint_interval: 1000,
            on_checkpoint: None,
        }
    }
}

/// Progress record returned by the recovery path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCheckpoint {
    pub processed_count: usize,
    pub last_successful_batch: usize,
    pub failed_documents: Vec<FailedDocument>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedDocument {
    pub index: usize,
    pub doc_id: String,
    pub error: String,
}

impl<A: StorageAdapter> SearchEngine<A> {
    /// Index many documents in batches. Postings become queryable as each
    /// batch's cache update lands; persistence happens in one flush at the
    /// end, so a crash before it loses the unpersisted prefix.
    pub async fn add_bulk(
        &mut self,
        docs: Vec<DocumentInput>,
        mut options: BulkOptions,
    ) -> Result<()> {
        self.ensure_open().await?;

        let total = docs.len();
        let mut processed = 0usize;
        let mut last_report: Option<Instant> = None;

        while processed < total {
            let batch_len = self.next_batch_size(&docs[processed..], &options);
            let batch = &docs[processed..processed + batch_len];
            let ingested = self.indexer.ingest_batch(batch)?;

            let mut touched = Vec::new();
            for (offset, (input, document)) in batch.iter().zip(ingested).enumerate() {
                self.process_ingested(input, document, &mut touched);

                if options.stream_progress {
                    let done = processed + offset + 1;
                    if done % options.progress_interval.max(1) == 0 || done == total {
                        if let Some(callback) = &mut options.on_progress {
                            callback(&BulkProgress {
                                processed: done,
                                total,
                            });
                        }
                    }
                }
            }
            self.refresh_term_cache(&touched);
            processed += batch_len;

            if !options.stream_progress {
                let due = last_report
                    .map(|at| at.elapsed() >= PROGRESS_THROTTLE)
                    .unwrap_or(true);
                if due {
                    if let Some(callback) = &mut options.on_progress {
                        callback(&BulkProgress { processed, total });
                        last_report = Some(Instant::now());
                    }
                }
            }
        }

        self.flush().await?;
        tracing::debug!("bulk indexed {} documents", total);
        Ok(())
    }

    /// Same batching as `add_bulk`, but every document is guarded: a
    /// failure lands in the returned checkpoint instead of aborting the
    /// run (unless `continue_on_error` is off). With checkpointing
    /// enabled, a flush plus callback fires every `checkpoint_interval`
    /// processed documents.
    pub async fn add_bulk_with_recovery(
        &mut self,
        docs: Vec<DocumentInput>,
        mut options: RecoveryOptions,
    ) -> Result<BulkCheckpoint> {
        self.ensure_open().await?;

        let total = docs.len();
        let mut checkpoint = BulkCheckpoint {
            processed_count: 0,
            last_successful_batch: 0,
            failed_documents: Vec::new(),
            timestamp: Utc::now(),
        };
        let mut offset = 0usize;
        let mut batch_index = 0usize;
        let mut since_checkpoint = 0usize;
        let mut last_report: Option<Instant> = None;

        while offset < total {
            let batch_len = self.next_batch_size(&docs[offset..], &options.bulk);
            let mut touched = Vec::new();

            for (position, input) in docs[offset..offset + batch_len].iter().enumerate() {
                match self.indexer.ingest(input) {
                    Ok(document) => {
                        self.process_ingested(input, document, &mut touched);
                        checkpoint.processed_count += 1;
                        since_checkpoint += 1;
                    }
                    Err(error) => {
                        tracing::warn!("bulk ingest failed for {}: {}", input.id, error);
                        checkpoint.failed_documents.push(FailedDocument {
                            index: offset + position,
                            doc_id: input.id.canonical(),
                            error: error.to_string(),
                        });
                        if !options.continue_on_error {
                            self.refresh_term_cache(&touched);
                            self.flush().await?;
                            checkpoint.timestamp = Utc::now();
                            return Ok(checkpoint);
                        }
                    }
                }

                if options.enable_checkpointing
                    && since_checkpoint >= options.checkpoint_interval.max(1)
                {
                    self.refresh_term_cache(&touched);
                    touched.clear();
                    self.flush().await?;
                    since_checkpoint = 0;
                    checkpoint.timestamp = Utc::now();
                    if let Some(callback) = &mut options.on_checkpoint {
                        callback(&checkpoint);
                    }
                }
            }

            self.refresh_term_cache(&touched);
            offset += batch_len;
            batch_index += 1;
            checkpoint.last_successful_batch = batch_index;

            let due = last_report
                .map(|at| at.elapsed() >= PROGRESS_THROTTLE)
                .unwrap_or(true);
            if due {
                if let Some(callback) = &mut options.bulk.on_progress {
                    callback(&BulkProgress {
                        processed: checkpoint.processed_count,
                        total,
                    });
                    last_report = Some(Instant::now());
                }
            }
        }

        self.flush().await?;
        checkpoint.timestamp = Utc::now();
        Ok(checkpoint)
    }

    /// Ingest one already-tokenized document: postings, stats and store
    /// queueing, without the per-document cache refresh or storage write.
    fn process_ingested(
        &mut self,
        input: &DocumentInput,
        document: IngestedDocument,
        touched: &mut Vec<(String, String)>,
    ) {
        if document.total_length == 0 {
            return;
        }
        let doc_key = input.id.canonical();
        touched.extend(self.apply_ingested(&doc_key, document));
        if let Some(payload) = &input.store {
            self.pending_documents.insert(doc_key, payload.clone());
        }
    }

    /// Size of the next batch. Adaptive mode estimates each document at
    /// twice its JSON length in bytes and stops once the memory budget is
    /// spent, within the configured bounds.
    fn next_batch_size(&self, remaining: &[DocumentInput], options: &BulkOptions) -> usize {
        if !options.adaptive {
            return options.batch_size.clamp(1, remaining.len());
        }

        let budget = options.max_memory_mb.saturating_mul(1024 * 1024);
        let mut used = 0usize;
        let mut count = 0usize;

        for document in remaining.iter().take(options.max_batch_size.max(1)) {
            let estimate = serde_json::to_string(document)
                .map(|json| json.len() * 2)
                .unwrap_or(1024);
            if count >= options.min_batch_size.max(1) && used + estimate > budget {
                break;
            }
            used += estimate;
            count += 1;
        }

        count.clamp(1, remaining.len())
    }
}
