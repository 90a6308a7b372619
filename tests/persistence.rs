//! Warm-restart and durability tests over the file-backed adapter.

use std::path::Path;

use strandex::core::config::EngineConfig;
use strandex::core::types::{DocKey, DocumentInput};
use strandex::engine::{AddOptions, SearchEngine};
use strandex::search::query::SearchOptions;
use strandex::storage::file::FileAdapter;
use tempfile::TempDir;

fn engine_at(path: &Path) -> SearchEngine<FileAdapter> {
    let config = EngineConfig::new("persist-index", &["title", "body"]);
    SearchEngine::new(config, FileAdapter::new(path)).unwrap()
}

fn doc(id: &str, title: &str) -> DocumentInput {
    DocumentInput::new(id).field("title", title)
}

#[tokio::test]
async fn flushed_state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db");

    let mut engine = engine_at(&path);
    engine
        .add(doc("doc-1", "anthropic research").store(serde_json::json!({"rank": 1})))
        .await
        .unwrap();
    engine.flush().await.unwrap();
    drop(engine);

    let mut reopened = engine_at(&path);
    let ids = reopened
        .search("research", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(ids, vec!["doc-1"]);

    // stats and vocabulary blobs are warmed on open: average length is
    // restored and fuzzy expansion sees the persisted vocabulary
    let options = SearchOptions {
        fuzzy: Some(2),
        ..SearchOptions::default()
    };
    let fuzzy_ids = reopened.search("anthopric", &options).await.unwrap();
    assert_eq!(fuzzy_ids, vec!["doc-1"]);

    let payload = reopened.get_document(&DocKey::from("doc-1")).await.unwrap();
    assert_eq!(payload, Some(serde_json::json!({"rank": 1})));
}

#[tokio::test]
async fn unpersisted_add_is_lost_on_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db");

    let mut engine = engine_at(&path);
    engine
        .add_with_options(doc("doc-1", "ephemeral fox"), &AddOptions { persist: false })
        .await
        .unwrap();
    // searchable in memory before the restart
    assert_eq!(
        engine.search("fox", &SearchOptions::default()).await.unwrap(),
        vec!["doc-1"]
    );
    drop(engine);

    let mut reopened = engine_at(&path);
    assert!(reopened
        .search("fox", &SearchOptions::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn remove_after_warming_edits_persisted_chunks() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db");

    let mut engine = engine_at(&path);
    engine.add(doc("doc-1", "shared fox")).await.unwrap();
    engine.add(doc("doc-2", "shared den")).await.unwrap();
    engine.flush().await.unwrap();
    drop(engine);

    let mut session = engine_at(&path);
    // querying loads the persisted chunks into memory, so the remove
    // below can edit and re-persist them
    session.search("shared", &SearchOptions::default()).await.unwrap();
    session.search("fox", &SearchOptions::default()).await.unwrap();
    session.remove(&DocKey::from("doc-1")).await.unwrap();
    drop(session);

    let mut reopened = engine_at(&path);
    assert_eq!(
        reopened.search("shared", &SearchOptions::default()).await.unwrap(),
        vec!["doc-2"]
    );
    assert!(reopened
        .search("fox", &SearchOptions::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn clear_persists_the_empty_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db");

    let mut engine = engine_at(&path);
    engine.add(doc("doc-1", "fox")).await.unwrap();
    engine.flush().await.unwrap();
    engine.clear().await.unwrap();
    drop(engine);

    let mut reopened = engine_at(&path);
    assert!(reopened
        .search("fox", &SearchOptions::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn destroy_deletes_the_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db");

    let mut engine = engine_at(&path);
    engine.add(doc("doc-1", "fox")).await.unwrap();
    engine.flush().await.unwrap();
    engine.destroy().await.unwrap();

    assert!(!path.exists());
}
