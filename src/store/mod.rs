//! Persistence layer — document store trait and its libSQL backend.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{DocumentStore, NewDocument, RoutingOutcome, StoredDocument};
