//! Cookie records and payload validation.
//!
//! # Data Flow
//! ```text
//! raw body bytes
//!     → validate.rs (JSON object, site identifier, cookies array)
//!     → NewCookieRecord
//!     → IngestionStore::insert stamps id + collected_at
//!     → CookieRecord (immutable)
//! ```

pub mod record;
pub mod validate;

pub use record::{CookieRecord, NewCookieRecord, RecordId};
pub use validate::{validate_payload, PayloadError};
