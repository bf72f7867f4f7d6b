//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers, graceful shutdown)
//!     → request.rs (x-request-id)
//!     → security (origin guard → rate limit → auth)
//!     → handlers.rs (validate, persist, read back)
//!     → response.rs (ApiError → status + JSON body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
