//! Shared types for the document routing pipeline.

use serde::{Deserialize, Serialize};

use crate::store::traits::StoredDocument;

/// Folder documents land in when OCR produced no usable text (or the
/// classifier produced no usable class). Not a document class itself.
pub const OCR_FAILED_FOLDER: &str = "ocr_failed";

// ── Document class ──────────────────────────────────────────────────

/// The closed set of classes the upstream classifier emits.
///
/// Folder names are identical to the class labels — one archive folder per
/// class, plus [`OCR_FAILED_FOLDER`] for the error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentClass {
    Letter,
    Form,
    Email,
    Handwritten,
    Advertisement,
    ScientificReport,
    ScientificPublication,
    Specification,
    FileFolder,
    NewsArticle,
    Budget,
    Invoice,
    Presentation,
    Questionnaire,
    Resume,
    Memo,
    Review,
}

impl DocumentClass {
    /// Every known class, in the order the archive folders are created.
    pub const ALL: [DocumentClass; 17] = [
        DocumentClass::Letter,
        DocumentClass::Form,
        DocumentClass::Email,
        DocumentClass::Handwritten,
        DocumentClass::Advertisement,
        DocumentClass::ScientificReport,
        DocumentClass::ScientificPublication,
        DocumentClass::Specification,
        DocumentClass::FileFolder,
        DocumentClass::NewsArticle,
        DocumentClass::Budget,
        DocumentClass::Invoice,
        DocumentClass::Presentation,
        DocumentClass::Questionnaire,
        DocumentClass::Resume,
        DocumentClass::Memo,
        DocumentClass::Review,
    ];

    /// The class label, which is also its archive folder name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Letter => "letter",
            Self::Form => "form",
            Self::Email => "email",
            Self::Handwritten => "handwritten",
            Self::Advertisement => "advertisement",
            Self::ScientificReport => "scientific_report",
            Self::ScientificPublication => "scientific_publication",
            Self::Specification => "specification",
            Self::FileFolder => "file_folder",
            Self::NewsArticle => "news_article",
            Self::Budget => "budget",
            Self::Invoice => "invoice",
            Self::Presentation => "presentation",
            Self::Questionnaire => "questionnaire",
            Self::Resume => "resume",
            Self::Memo => "memo",
            Self::Review => "review",
        }
    }

    /// Parse a class label. Returns `None` for anything outside the known
    /// set — the rule evaluator treats those as OCR failures.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == label)
    }
}

/// All archive folder names: one per class, plus the error folder.
pub fn all_folders() -> impl Iterator<Item = &'static str> {
    DocumentClass::ALL
        .iter()
        .map(DocumentClass::as_str)
        .chain(std::iter::once(OCR_FAILED_FOLDER))
}

// ── Document record ─────────────────────────────────────────────────

/// In-memory metadata for one document under consideration.
///
/// Materialized fresh from a store row at the start of a pipeline pass,
/// evaluated once, and discarded after its outcome is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Opaque stable identifier from the store.
    pub id: String,
    /// Current on-disk location. Consumed by the relocation step, never
    /// rewritten in place.
    pub file_path: String,
    pub file_name: String,
    /// Classification label from the upstream stage, if any.
    pub document_class: Option<String>,
    /// Classifier confidence in its native range.
    pub confidence: f64,
    /// OCR text, if any.
    pub extracted_text: Option<String>,
    /// Length of `extracted_text`; 0 when text is absent.
    pub text_length: usize,
}

impl DocumentRecord {
    /// Build a record from a store row, deriving `text_length` from the
    /// text itself rather than trusting a stored value.
    pub fn from_stored(doc: StoredDocument) -> Self {
        let text_length = doc.extracted_text.as_deref().map_or(0, str::len);
        Self {
            id: doc.id,
            file_path: doc.file_path,
            file_name: doc.file_name,
            document_class: doc.document_class,
            confidence: doc.confidence,
            extracted_text: doc.extracted_text,
            text_length,
        }
    }

    /// Whether the OCR stage produced any text for this document.
    pub fn has_text(&self) -> bool {
        self.text_length > 0
    }
}

// ── Routing decision ────────────────────────────────────────────────

/// Output of the rule evaluator for one record.
///
/// Every field is definite after evaluation — there is no undecided state
/// and no "no matching rule" outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    /// Destination folder under the archive root. Always a member of the
    /// closed folder set.
    pub target_folder: &'static str,
    pub needs_review: bool,
    pub ocr_failed: bool,
    pub requires_finance_approval: bool,
    pub needs_data_extraction: bool,
}
