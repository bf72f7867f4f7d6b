//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request needing storage:
//!     → timeouts.rs (deadline around the store call)
//!     → on timeout: StoreError::Timeout → 500 to the caller
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - No automatic retries; a failed attempt yields one error response

pub mod timeouts;

pub use timeouts::with_deadline;
