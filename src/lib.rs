//! # Docshelf - Document Repository
//!
//! Upload files with a title and description, then list, view, update,
//! download or delete them.
//!
//! Docshelf provides:
//! - SQLite-backed record store for document metadata
//! - Upload coordinator that keeps stored files and records consistent
//! - JSON CRUD + multipart upload API over axum
//! - CLI for driving the store from a terminal

pub mod config;
pub mod document;
pub mod output;
pub mod server;
pub mod storage;
pub mod upload;

// Re-exports for convenient access
pub use document::{DocumentPatch, DocumentRecord, UpdateField};
pub use storage::DocumentStore;
pub use upload::UploadCoordinator;

use std::path::PathBuf;

/// Result type alias for Docshelf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Docshelf operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing database could not be opened or its schema created.
    /// Fatal to the whole component; surfaced at startup.
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(#[source] rusqlite::Error),

    /// No record exists for the requested id. Distinct from a read
    /// failure so callers can render "not found" instead of an error page.
    #[error("Document {0} not found")]
    NotFound(i64),

    #[error("Failed to read from document store: {0}")]
    ReadFailed(#[source] rusqlite::Error),

    #[error("Failed to write to document store: {0}")]
    WriteFailed(#[source] rusqlite::Error),

    /// A field name outside the updatable set was supplied to a patch.
    #[error("Unknown document field: {0}")]
    InvalidField(String),

    /// An upload arrived without a filename or without any bytes.
    #[error("No file supplied")]
    EmptyUpload,

    /// The record exists but the file at its stored path is gone.
    #[error("Stored file missing at {}", .0.display())]
    FileMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
