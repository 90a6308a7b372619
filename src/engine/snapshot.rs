use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::TermPosting;
use crate::engine::SearchEngine;
use crate::index::postings::PostingEntry;
use crate::index::stats::DocLengthEntry;
use crate::storage::adapter::StorageAdapter;

/// Serialisable description of the engine's indexed state, sufficient to
/// rebuild a functionally equivalent engine. Carries queued stored
/// documents and the vocabulary alongside postings and stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub postings: Vec<SnapshotTerm>,
    pub stats: Vec<DocLengthEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<SnapshotDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vocabulary: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotTerm {
    pub field: String,
    pub term: String,
    pub documents: Vec<TermPosting>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    pub doc_id: String,
    pub payload: serde_json::Value,
}

/// Flattened, transport-safe snapshot for worker handoff: parallel doc-id
/// and frequency arrays per term, no per-posting metadata. Prefix/fuzzy
/// scoring metadata does not survive this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSnapshot {
    pub postings: Vec<WorkerTerm>,
    pub stats: Vec<DocLengthEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerTerm {
    pub field: String,
    pub term: String,
    pub doc_ids: Vec<String>,
    pub term_frequencies: Vec<f64>,
}

impl<A: StorageAdapter> SearchEngine<A> {
    /// Export the in-memory indexed state. Stored documents already
    /// persisted stay in the adapter; only queued ones travel with the
    /// snapshot.
    pub async fn export_snapshot(&mut self) -> Result<EngineSnapshot> {
        self.ensure_open().await?;

        let mut postings: Vec<SnapshotTerm> = self
            .postings
            .iter()
            .map(|(field, term, documents)| SnapshotTerm {
                field: field.clone(),
                term: term.clone(),
                documents: documents
                    .iter()
                    .map(|(doc_key, entry)| TermPosting {
                        doc_id: doc_key.clone(),
                        term_frequency: entry.frequency,
                        metadata: entry.metadata.clone(),
                    })
                    .collect(),
            })
            .collect();
        postings.sort_by(|a, b| (&a.field, &a.term).cmp(&(&b.field, &b.term)));

        let mut documents: Vec<SnapshotDocument> = self
            .pending_documents
            .iter()
            .map(|(doc_id, payload)| SnapshotDocument {
                doc_id: doc_id.clone(),
                payload: payload.clone(),
            })
            .collect();
        documents.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));

        Ok(EngineSnapshot {
            postings,
            stats: self.stats.snapshot(),
            documents,
            vocabulary: self.vocabulary.snapshot(),
        })
    }

    /// Replace the engine's entire indexed state with the snapshot and
    /// persist its postings so the imported contents are durable.
    pub async fn import_snapshot(&mut self, snapshot: EngineSnapshot) -> Result<()> {
        self.ensure_open().await?;

        self.postings.clear();
        self.term_cache.clear();
        self.pending_documents.clear();

        self.stats.load(snapshot.stats);
        self.stats_dirty = true;
        self.vocabulary.load(snapshot.vocabulary);
        self.vocabulary.mark_dirty();

        for term in snapshot.postings {
            for posting in term.documents {
                self.postings.upsert(
                    &term.field,
                    &term.term,
                    &posting.doc_id,
                    PostingEntry {
                        frequency: posting.term_frequency,
                        metadata: posting.metadata,
                    },
                );
            }
        }
        for document in snapshot.documents {
            self.pending_documents
                .insert(document.doc_id, document.payload);
        }

        self.persist_postings().await?;
        tracing::debug!("imported snapshot ({} terms)", self.postings.term_count());
        Ok(())
    }

    /// Export the flattened worker shape. Lossy: per-posting metadata is
    /// dropped, so prefix penalties disappear after a round trip.
    pub async fn export_worker_snapshot(&mut self) -> Result<WorkerSnapshot> {
        self.ensure_open().await?;

        let mut postings: Vec<WorkerTerm> = self
            .postings
            .iter()
            .map(|(field, term, documents)| {
                let mut doc_ids = Vec::with_capacity(documents.len());
                let mut term_frequencies = Vec::with_capacity(documents.len());
                for (doc_key, entry) in documents {
                    doc_ids.push(doc_key.clone());
                    term_frequencies.push(entry.frequency);
                }
                WorkerTerm {
                    field: field.clone(),
                    term: term.clone(),
                    doc_ids,
                    term_frequencies,
                }
            })
            .collect();
        postings.sort_by(|a, b| (&a.field, &a.term).cmp(&(&b.field, &b.term)));

        Ok(WorkerSnapshot {
            postings,
            stats: self.stats.snapshot(),
        })
    }

    /// Replace indexed state from a worker snapshot. The payload carries
    /// no metadata or vocabulary, so imported postings score without
    /// prefix penalties and fuzzy expansion starts empty.
    pub async fn import_worker_snapshot(&mut self, snapshot: WorkerSnapshot) -> Result<()> {
        self.ensure_open().await?;

        self.postings.clear();
        self.term_cache.clear();
        self.vocabulary.clear();

        self.stats.load(snapshot.stats);
        self.stats_dirty = true;

        for term in snapshot.postings {
            for (doc_id, frequency) in term.doc_ids.iter().zip(&term.term_frequencies) {
                self.postings.upsert(
                    &term.field,
                    &term.term,
                    doc_id,
                    PostingEntry {
                        frequency: *frequency,
                        metadata: Default::default(),
                    },
                );
            }
        }

        self.persist_postings().await?;
        Ok(())
    }
}
