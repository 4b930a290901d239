//! End-to-end routing sweeps against a real (in-memory) store and a real
//! temp filesystem.

use std::sync::Arc;

use doc_router::pipeline::{Archive, DocumentRouter, RuleSet, all_folders};
use doc_router::store::{DocumentStore, LibSqlBackend, NewDocument};

async fn insert_with_file(
    store: &LibSqlBackend,
    inbox: &std::path::Path,
    name: &str,
    class: Option<&str>,
    text: Option<&str>,
    confidence: f64,
) -> String {
    let path = inbox.join(name);
    tokio::fs::write(&path, format!("contents of {name}"))
        .await
        .unwrap();
    store
        .insert_document(&NewDocument {
            file_path: path.to_string_lossy().into_owned(),
            file_name: name.to_string(),
            document_class: class.map(String::from),
            confidence,
            extracted_text: text.map(String::from),
        })
        .await
        .unwrap()
}

fn router(store: Arc<LibSqlBackend>, root: &std::path::Path) -> DocumentRouter {
    DocumentRouter::new(store, Archive::new(root), RuleSet::default_rules())
}

#[tokio::test]
async fn end_to_end_resume_scenario() {
    let inbox = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());

    let id = insert_with_file(
        &store,
        inbox.path(),
        "jdoe.pdf",
        Some("resume"),
        Some("John Doe, 5 years experience"),
        0.93,
    )
    .await;

    let summary = router(store.clone(), root.path()).run().await.unwrap();
    assert_eq!(summary.processed, 1);

    let doc = store.get_document(&id).await.unwrap().unwrap();
    assert!(doc.processed_for_routing);
    assert_eq!(doc.target_folder.as_deref(), Some("resume"));
    assert_eq!(doc.needs_review, Some(false));
    assert_eq!(doc.ocr_failed, Some(false));
    assert!(doc.routed_at.is_some());

    assert!(!inbox.path().join("jdoe.pdf").exists());
    assert!(root.path().join("resume").join("jdoe.pdf").exists());
}

#[tokio::test]
async fn startup_creates_every_archive_folder() {
    let root = tempfile::tempdir().unwrap();
    let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());

    router(store, root.path()).run().await.unwrap();

    for folder in all_folders() {
        assert!(root.path().join(folder).is_dir(), "missing {folder}");
    }
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let inbox = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());

    insert_with_file(&store, inbox.path(), "a.pdf", Some("email"), Some("hi"), 0.9).await;
    insert_with_file(&store, inbox.path(), "b.pdf", Some("memo"), Some("note"), 0.9).await;

    let r = router(store.clone(), root.path());
    let first = r.run().await.unwrap();
    assert_eq!(first.processed, 2);

    let target = root.path().join("email").join("a.pdf");
    let before = tokio::fs::metadata(&target).await.unwrap().modified().unwrap();

    let second = r.run().await.unwrap();
    assert_eq!(second.processed, 0);
    assert_eq!(second.moved, 0);

    // Nothing was re-moved.
    let after = tokio::fs::metadata(&target).await.unwrap().modified().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn same_name_overwrites_previous_file() {
    let inbox = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let r = router(store.clone(), root.path());

    // Two sweeps, same file name both times.
    let first_path = inbox.path().join("scan.pdf");
    tokio::fs::write(&first_path, "first scan").await.unwrap();
    store
        .insert_document(&NewDocument {
            file_path: first_path.to_string_lossy().into_owned(),
            file_name: "scan.pdf".into(),
            document_class: Some("invoice".into()),
            confidence: 0.9,
            extracted_text: Some("Total due: 100".into()),
        })
        .await
        .unwrap();
    r.run().await.unwrap();

    tokio::fs::write(&first_path, "second scan").await.unwrap();
    store
        .insert_document(&NewDocument {
            file_path: first_path.to_string_lossy().into_owned(),
            file_name: "scan.pdf".into(),
            document_class: Some("invoice".into()),
            confidence: 0.9,
            extracted_text: Some("Total due: 200".into()),
        })
        .await
        .unwrap();
    r.run().await.unwrap();

    let archived = root.path().join("invoice").join("scan.pdf");
    assert_eq!(
        tokio::fs::read_to_string(&archived).await.unwrap(),
        "second scan"
    );
}

#[tokio::test]
async fn missing_source_does_not_stop_the_batch() {
    let inbox = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());

    let ghost = store
        .insert_document(&NewDocument {
            file_path: inbox.path().join("ghost.pdf").to_string_lossy().into_owned(),
            file_name: "ghost.pdf".into(),
            document_class: Some("form".into()),
            confidence: 0.9,
            extracted_text: Some("Name: ____".into()),
        })
        .await
        .unwrap();
    let real = insert_with_file(
        &store,
        inbox.path(),
        "real.pdf",
        Some("form"),
        Some("Name: Jane"),
        0.9,
    )
    .await;

    let summary = router(store.clone(), root.path()).run().await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.moved, 1);
    assert_eq!(summary.failed_moves, 1);

    let ghost_doc = store.get_document(&ghost).await.unwrap().unwrap();
    assert!(ghost_doc.processed_for_routing);
    assert!(ghost_doc.routing_error.is_some());

    let real_doc = store.get_document(&real).await.unwrap().unwrap();
    assert!(real_doc.routing_error.is_none());
    assert!(root.path().join("form").join("real.pdf").exists());
}

#[tokio::test]
async fn mixed_batch_lands_in_the_right_folders() {
    let inbox = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());

    insert_with_file(&store, inbox.path(), "inv.pdf", Some("invoice"), Some("€"), 0.9).await;
    insert_with_file(&store, inbox.path(), "news.pdf", Some("news_article"), Some("…"), 0.9).await;
    insert_with_file(&store, inbox.path(), "junk.pdf", Some("weird_class"), Some("…"), 0.9).await;
    insert_with_file(&store, inbox.path(), "blank.pdf", Some("letter"), None, 0.9).await;

    let summary = router(store, root.path()).run().await.unwrap();
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.moved, 4);

    assert!(root.path().join("invoice").join("inv.pdf").exists());
    assert!(root.path().join("news_article").join("news.pdf").exists());
    assert!(root.path().join("ocr_failed").join("junk.pdf").exists());
    assert!(root.path().join("ocr_failed").join("blank.pdf").exists());
}
