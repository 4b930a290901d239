//! libSQL backend — async `DocumentStore` implementation.
//!
//! Supports local file and in-memory databases. The documents table name
//! comes from configuration and is validated before it touches any SQL.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::traits::{DocumentStore, NewDocument, RoutingOutcome, StoredDocument};

/// Column list shared by every SELECT; `row_to_document` depends on this
/// order.
const DOCUMENT_COLUMNS: &str = "id, file_path, file_name, document_class, confidence, \
     extracted_text, processed_for_routing, target_folder, needs_review, \
     ocr_failed, routing_error, routed_at";

/// libSQL document store.
///
/// Holds a single connection reused for all operations —
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    table: String,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path, table: &str) -> Result<Self, StoreError> {
        migrations::validate_table_name(table)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn, table).await?;
        info!(path = %path.display(), table, "Document store opened");

        Ok(Self {
            db: Arc::new(db),
            conn,
            table: table.to_string(),
        })
    }

    /// Create an in-memory store (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StoreError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn, "documents").await?;

        Ok(Self {
            db: Arc::new(db),
            conn,
            table: "documents".to_string(),
        })
    }
}

#[async_trait]
impl DocumentStore for LibSqlBackend {
    async fn insert_document(&self, doc: &NewDocument) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let sql = format!(
            "INSERT INTO {} (id, file_path, file_name, document_class, confidence, \
                extracted_text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            self.table
        );
        self.conn
            .execute(
                &sql,
                params![
                    id.clone(),
                    doc.file_path.clone(),
                    doc.file_name.clone(),
                    opt_text(doc.document_class.as_deref()),
                    doc.confidence,
                    opt_text(doc.extracted_text.as_deref()),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Failed to insert document: {e}")))?;
        debug!(id = %id, file = %doc.file_name, "Document inserted");
        Ok(id)
    }

    async fn fetch_unrouted(&self) -> Result<Vec<StoredDocument>, StoreError> {
        // IS NOT 1 keeps both NULL (marker absent) and 0 (explicitly
        // false) eligible.
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM {} \
             WHERE processed_for_routing IS NOT 1 ORDER BY created_at ASC",
            self.table
        );
        let mut rows = self
            .conn
            .query(&sql, ())
            .await
            .map_err(|e| StoreError::Query(format!("Failed to query unrouted documents: {e}")))?;

        let mut documents = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("Failed to read document row: {e}")))?
        {
            documents.push(row_to_document(&row)?);
        }
        Ok(documents)
    }

    async fn mark_routed(&self, id: &str, outcome: &RoutingOutcome) -> Result<(), StoreError> {
        let sql = format!(
            "UPDATE {} SET processed_for_routing = 1, target_folder = ?1, \
                needs_review = ?2, ocr_failed = ?3, routing_error = ?4, routed_at = ?5
             WHERE id = ?6",
            self.table
        );
        let affected = self
            .conn
            .execute(
                &sql,
                params![
                    outcome.target_folder.clone(),
                    outcome.needs_review as i64,
                    outcome.ocr_failed as i64,
                    opt_text(outcome.routing_error.as_deref()),
                    outcome.routed_at.to_rfc3339(),
                    id,
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Failed to mark document routed: {e}")))?;

        if affected == 0 {
            return Err(StoreError::Query(format!("No document with id {id}")));
        }
        debug!(id, folder = %outcome.target_folder, "Document marked routed");
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM {} WHERE id = ?1",
            self.table
        );
        let mut rows = self
            .conn
            .query(&sql, params![id])
            .await
            .map_err(|e| StoreError::Query(format!("Failed to query document: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("Failed to read document row: {e}")))?
        {
            Some(row) => Ok(Some(row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    async fn count_documents(&self) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let mut rows = self
            .conn
            .query(&sql, ())
            .await
            .map_err(|e| StoreError::Query(format!("Failed to count documents: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("Failed to read count: {e}")))?
            .ok_or_else(|| StoreError::Query("COUNT returned no row".to_string()))?;

        let count: i64 = row
            .get(0)
            .map_err(|e| StoreError::Query(format!("Failed to parse count: {e}")))?;
        Ok(count as u64)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Convert `Option<&str>` to a libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(v) => libsql::Value::Text(v.to_string()),
        None => libsql::Value::Null,
    }
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Map a libsql Row to a StoredDocument. Column order matches
/// `DOCUMENT_COLUMNS`.
fn row_to_document(row: &libsql::Row) -> Result<StoredDocument, StoreError> {
    let field = |e: libsql::Error| StoreError::Query(format!("Failed to read column: {e}"));

    let id: String = row.get(0).map_err(field)?;
    let file_path: String = row.get(1).map_err(field)?;
    let file_name: String = row.get(2).map_err(field)?;
    let document_class: Option<String> = row.get(3).ok();
    let confidence: f64 = row.get(4).map_err(field)?;
    let extracted_text: Option<String> = row.get(5).ok();
    let processed: Option<i64> = row.get(6).ok();
    let target_folder: Option<String> = row.get(7).ok();
    let needs_review: Option<i64> = row.get(8).ok();
    let ocr_failed: Option<i64> = row.get(9).ok();
    let routing_error: Option<String> = row.get(10).ok();
    let routed_at: Option<String> = row.get(11).ok();

    Ok(StoredDocument {
        id,
        file_path,
        file_name,
        document_class,
        confidence,
        extracted_text,
        processed_for_routing: processed == Some(1),
        target_folder,
        needs_review: needs_review.map(|v| v != 0),
        ocr_failed: ocr_failed.map(|v| v != 0),
        routing_error,
        routed_at: routed_at.as_deref().map(parse_datetime),
    })
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn new_doc(class: Option<&str>, text: Option<&str>) -> NewDocument {
        NewDocument {
            file_path: "/tmp/in/scan.pdf".into(),
            file_name: "scan.pdf".into(),
            document_class: class.map(String::from),
            confidence: 0.9,
            extracted_text: text.map(String::from),
        }
    }

    fn outcome(folder: &str) -> RoutingOutcome {
        RoutingOutcome {
            target_folder: folder.into(),
            needs_review: false,
            ocr_failed: false,
            routing_error: None,
            routed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_unrouted() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let id = store
            .insert_document(&new_doc(Some("invoice"), Some("Total: 42")))
            .await
            .unwrap();

        let unrouted = store.fetch_unrouted().await.unwrap();
        assert_eq!(unrouted.len(), 1);
        assert_eq!(unrouted[0].id, id);
        assert_eq!(unrouted[0].document_class.as_deref(), Some("invoice"));
        assert_eq!(unrouted[0].extracted_text.as_deref(), Some("Total: 42"));
        assert!(!unrouted[0].processed_for_routing);
        assert!(unrouted[0].target_folder.is_none());
    }

    #[tokio::test]
    async fn nullable_fields_read_back_as_none() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        store.insert_document(&new_doc(None, None)).await.unwrap();

        let unrouted = store.fetch_unrouted().await.unwrap();
        assert!(unrouted[0].document_class.is_none());
        assert!(unrouted[0].extracted_text.is_none());
        assert!(unrouted[0].routed_at.is_none());
    }

    #[tokio::test]
    async fn fetch_skips_routed_documents() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let id1 = store
            .insert_document(&new_doc(Some("letter"), Some("a")))
            .await
            .unwrap();
        let id2 = store
            .insert_document(&new_doc(Some("memo"), Some("b")))
            .await
            .unwrap();

        store.mark_routed(&id1, &outcome("letter")).await.unwrap();

        let unrouted = store.fetch_unrouted().await.unwrap();
        assert_eq!(unrouted.len(), 1);
        assert_eq!(unrouted[0].id, id2);
    }

    #[tokio::test]
    async fn explicit_false_marker_stays_eligible() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let id = store
            .insert_document(&new_doc(Some("letter"), Some("a")))
            .await
            .unwrap();

        // Simulate an upstream writer that sets the marker to 0 instead of
        // leaving it absent.
        store
            .conn
            .execute(
                "UPDATE documents SET processed_for_routing = 0 WHERE id = ?1",
                params![id.clone()],
            )
            .await
            .unwrap();

        let unrouted = store.fetch_unrouted().await.unwrap();
        assert_eq!(unrouted.len(), 1);
        assert_eq!(unrouted[0].id, id);
    }

    #[tokio::test]
    async fn mark_routed_persists_outcome() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let id = store
            .insert_document(&new_doc(Some("resume"), Some("5 years experience")))
            .await
            .unwrap();

        let out = RoutingOutcome {
            target_folder: "resume".into(),
            needs_review: false,
            ocr_failed: false,
            routing_error: None,
            routed_at: Utc::now(),
        };
        store.mark_routed(&id, &out).await.unwrap();

        let doc = store.get_document(&id).await.unwrap().unwrap();
        assert!(doc.processed_for_routing);
        assert_eq!(doc.target_folder.as_deref(), Some("resume"));
        assert_eq!(doc.needs_review, Some(false));
        assert_eq!(doc.ocr_failed, Some(false));
        assert!(doc.routing_error.is_none());
        assert!(doc.routed_at.is_some());
    }

    #[tokio::test]
    async fn mark_routed_records_failure_marker() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let id = store
            .insert_document(&new_doc(Some("invoice"), Some("x")))
            .await
            .unwrap();

        let out = RoutingOutcome {
            target_folder: "invoice".into(),
            needs_review: false,
            ocr_failed: false,
            routing_error: Some("Source file not found: /tmp/in/scan.pdf".into()),
            routed_at: Utc::now(),
        };
        store.mark_routed(&id, &out).await.unwrap();

        let doc = store.get_document(&id).await.unwrap().unwrap();
        assert!(doc.processed_for_routing);
        assert!(doc.routing_error.as_deref().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn mark_routed_unknown_id_fails() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let result = store.mark_routed("no-such-id", &outcome("letter")).await;
        assert!(matches!(result, Err(StoreError::Query(_))));
    }

    #[tokio::test]
    async fn get_document_not_found_is_none() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        assert!(store.get_document("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn count_documents_counts_everything() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        assert_eq!(store.count_documents().await.unwrap(), 0);

        let id = store
            .insert_document(&new_doc(Some("letter"), Some("a")))
            .await
            .unwrap();
        store.insert_document(&new_doc(None, None)).await.unwrap();
        store.mark_routed(&id, &outcome("letter")).await.unwrap();

        // Routed documents still count.
        assert_eq!(store.count_documents().await.unwrap(), 2);
    }
}
