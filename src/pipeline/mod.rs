//! Document routing pipeline — rule evaluation, relocation, orchestration.

pub mod processor;
pub mod relocate;
pub mod rules;
pub mod types;

pub use processor::{DocumentRouter, RunSummary};
pub use relocate::Archive;
pub use rules::RuleSet;
pub use types::{DocumentClass, DocumentRecord, OCR_FAILED_FOLDER, RoutingDecision, all_folders};
