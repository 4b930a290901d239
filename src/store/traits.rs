//! `DocumentStore` trait — the seam between the pipeline and whatever
//! database holds the classified documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// A document row as read from the store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub file_path: String,
    pub file_name: String,
    pub document_class: Option<String>,
    pub confidence: f64,
    pub extracted_text: Option<String>,
    /// Absent and explicitly-false both read back as `false` — either
    /// makes the document eligible for routing.
    pub processed_for_routing: bool,
    pub target_folder: Option<String>,
    pub needs_review: Option<bool>,
    pub ocr_failed: Option<bool>,
    pub routing_error: Option<String>,
    pub routed_at: Option<DateTime<Utc>>,
}

/// A document as written by the upstream classification stage.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub file_path: String,
    pub file_name: String,
    pub document_class: Option<String>,
    pub confidence: f64,
    pub extracted_text: Option<String>,
}

/// Everything one pipeline pass persists for a record.
///
/// `routing_error` is set when the physical move failed; the record is
/// still marked processed (failed moves are terminal, not retried) and the
/// error text keeps the failure operator-visible.
#[derive(Debug, Clone)]
pub struct RoutingOutcome {
    pub target_folder: String,
    pub needs_review: bool,
    pub ocr_failed: bool,
    pub routing_error: Option<String>,
    pub routed_at: DateTime<Utc>,
}

/// Backend-agnostic document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a freshly-classified document. Returns the generated ID.
    /// This is the upstream stage's write path; the router only reads.
    async fn insert_document(&self, doc: &NewDocument) -> Result<String, StoreError>;

    /// All documents not yet processed for routing, oldest first.
    ///
    /// This filter is the pipeline's sole idempotency guard: a document
    /// marked processed is never returned again.
    async fn fetch_unrouted(&self) -> Result<Vec<StoredDocument>, StoreError>;

    /// Persist a pipeline pass: set the processed marker and the routing
    /// outcome for `id`.
    async fn mark_routed(&self, id: &str, outcome: &RoutingOutcome) -> Result<(), StoreError>;

    /// Fetch one document by ID.
    async fn get_document(&self, id: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// Total number of documents in the store.
    async fn count_documents(&self) -> Result<u64, StoreError>;
}
