//! Routing rule evaluator.
//!
//! A small fixed rule set evaluated procedurally — no production-rule
//! engine, no runtime reloading. The OCR-failure check short-circuits
//! everything else; the remaining rules are independent predicates over
//! disjoint flags:
//! - missing/unknown class or empty text → `ocr_failed` folder
//! - invoice/budget → finance approval
//! - form/questionnaire/specification → data extraction

use tracing::debug;

use crate::pipeline::types::{DocumentClass, DocumentRecord, OCR_FAILED_FOLDER, RoutingDecision};

/// Rule tables mapping a document's classification to a routing decision.
///
/// Pure and stateless across records: `evaluate` does no I/O and its output
/// depends only on the record passed in.
#[derive(Debug, Clone)]
pub struct RuleSet {
    /// Classes whose documents need finance sign-off.
    finance_classes: Vec<DocumentClass>,
    /// Classes whose documents feed the data-extraction stage.
    extraction_classes: Vec<DocumentClass>,
    /// Optional confidence gate: recognized documents scoring below this
    /// are diverted to the review folder.
    review_below: Option<f64>,
}

impl RuleSet {
    /// The default rule tables. No confidence gate.
    pub fn default_rules() -> Self {
        Self {
            finance_classes: vec![DocumentClass::Invoice, DocumentClass::Budget],
            extraction_classes: vec![
                DocumentClass::Form,
                DocumentClass::Questionnaire,
                DocumentClass::Specification,
            ],
            review_below: None,
        }
    }

    /// A rule set with no class rules (for testing).
    pub fn empty() -> Self {
        Self {
            finance_classes: Vec::new(),
            extraction_classes: Vec::new(),
            review_below: None,
        }
    }

    /// Divert recognized documents with confidence below `threshold` to the
    /// review folder.
    pub fn with_review_below(mut self, threshold: f64) -> Self {
        self.review_below = Some(threshold);
        self
    }

    /// Evaluate one record. Total: every (class, text) combination yields a
    /// defined decision.
    pub fn evaluate(&self, record: &DocumentRecord) -> RoutingDecision {
        // OCR-failure path: no usable class or no text. Suppresses every
        // other rule for this record.
        let class = record
            .document_class
            .as_deref()
            .and_then(DocumentClass::parse);

        let Some(class) = class else {
            debug!(
                id = %record.id,
                class = record.document_class.as_deref().unwrap_or("<none>"),
                "No usable document class, routing to OCR-failed"
            );
            return ocr_failed_decision();
        };

        if !record.has_text() {
            debug!(id = %record.id, "No extracted text, routing to OCR-failed");
            return ocr_failed_decision();
        }

        let requires_finance_approval = self.finance_classes.contains(&class);
        let needs_data_extraction = self.extraction_classes.contains(&class);

        // Low-confidence gate, when configured. Class flags still apply —
        // the document is diverted, not unflagged.
        if let Some(threshold) = self.review_below
            && record.confidence < threshold
        {
            debug!(
                id = %record.id,
                confidence = record.confidence,
                threshold,
                "Low confidence, diverting to review"
            );
            return RoutingDecision {
                target_folder: DocumentClass::Review.as_str(),
                needs_review: true,
                ocr_failed: false,
                requires_finance_approval,
                needs_data_extraction,
            };
        }

        RoutingDecision {
            target_folder: class.as_str(),
            needs_review: false,
            ocr_failed: false,
            requires_finance_approval,
            needs_data_extraction,
        }
    }
}

fn ocr_failed_decision() -> RoutingDecision {
    RoutingDecision {
        target_folder: OCR_FAILED_FOLDER,
        needs_review: true,
        ocr_failed: true,
        requires_finance_approval: false,
        needs_data_extraction: false,
    }
}
