//! Ingestion store.
//!
//! # Responsibilities
//! - Persist one validated record per call, atomically
//! - Return the most recent records, newest first, bounded by a limit
//! - Report connectivity for startup and readiness checks
//!
//! # Design Decisions
//! - The pipeline only sees `Arc<dyn IngestionStore>`; the backend is chosen
//!   from configuration at startup (`lifecycle::startup`)
//! - Backend errors are mapped to `StoreError` at this boundary; callers never
//!   see driver types
//! - Deadlines are applied by the caller (see `resilience::timeouts`)

pub mod memory;
pub mod mongo;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::ingest::{CookieRecord, NewCookieRecord, RecordId};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The call did not complete before its deadline.
    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    /// The backend could not be reached.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed the operation.
    #[error("storage operation failed: {0}")]
    Backend(String),

    /// A stored document could not be decoded.
    #[error("stored record is malformed: {0}")]
    Corrupt(String),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract consumed by the request pipeline.
#[async_trait]
pub trait IngestionStore: Send + Sync {
    /// Persist a record, stamping `collected_at` with the current time when
    /// the caller did not supply one.
    async fn insert(&self, record: NewCookieRecord) -> StoreResult<RecordId>;

    /// Up to `limit` records ordered by `collected_at` descending.
    async fn recent(&self, limit: usize) -> StoreResult<Vec<CookieRecord>>;

    /// Round-trip to the backend.
    async fn ping(&self) -> StoreResult<()>;

    /// Idempotent one-time setup such as indexes. Retried until it succeeds
    /// once, since the backend may be down when the service starts.
    async fn prepare(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
