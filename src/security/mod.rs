//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (Origin guard, CORS preflight)
//!     → rate_limit.rs (per-client fixed window)
//!     → auth.rs (x-api-key, protected routes only)
//!     → Pass to handlers
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Each stage short-circuits with its own status code
//! - No trust in client input

pub mod auth;
pub mod origin;
pub mod rate_limit;

pub use auth::{api_key_middleware, authorize, Authorization, API_KEY_HEADER};
pub use origin::{check_origin, cors_layer, origin_guard_middleware, OriginCheck};
pub use rate_limit::{rate_limit_middleware, RateDecision, RateLimiter};
