//! Cookie collector library.
//!
//! An HTTP ingestion service for per-site cookie batches submitted by a
//! browser extension. Every request passes origin guard → rate limiter →
//! API key check → payload validation before a record reaches the store.

pub mod config;
pub mod http;
pub mod ingest;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod storage;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
