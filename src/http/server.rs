//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware in pipeline order (origin → CORS → rate limit → auth)
//! - Wire up cross-cutting layers (tracing, request ID, timeout, body limit, metrics)
//! - Run the rate limiter sweep alongside the server
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    BoxError, Router,
};
use tokio::net::TcpListener;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::request::request_id_layer;
use crate::http::response::ApiError;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::security::{
    api_key_middleware, cors_layer, origin_guard_middleware, rate_limit_middleware, RateLimiter,
};
use crate::storage::IngestionStore;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub store: Arc<dyn IngestionStore>,
    pub rate_limiter: Arc<RateLimiter>,
    /// Set once `IngestionStore::prepare` has succeeded.
    pub store_prepared: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: ServiceConfig, store: Arc<dyn IngestionStore>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        Self {
            config: Arc::new(config),
            store,
            rate_limiter,
            store_prepared: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Deadline applied to each store call.
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.config.storage.timeout_ms)
    }
}

/// HTTP server for the collector.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and store.
    pub fn new(config: ServiceConfig, store: Arc<dyn IngestionStore>) -> Self {
        let state = AppState::new(config, store);
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers added later wrap the ones added earlier, so the request path is
    /// trace → request id → timeout → metrics → origin guard → CORS →
    /// rate limit → body limit → auth. Preflights end at the CORS layer.
    pub fn build_router(state: AppState) -> Router {
        let config = state.config.clone();

        let protected = Router::new()
            .route("/collect", post(handlers::collect))
            .route("/logs", get(handlers::recent_logs))
            .route_layer(middleware::from_fn_with_state(state.clone(), api_key_middleware));

        Router::new()
            .route("/", get(handlers::liveness))
            .route("/health/ready", get(handlers::readiness))
            .merge(protected)
            .method_not_allowed_fallback(handlers::method_not_allowed)
            .fallback(handlers::not_found)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
            .layer(cors_layer(&config.cors))
            .layer(middleware::from_fn_with_state(state.clone(), origin_guard_middleware))
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(request_timed_out))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
            .layer(request_id_layer())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.state.config
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires, then wait for background tasks to stop.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            store = self.state.store.backend_name(),
            "HTTP server starting"
        );

        let mut stop = shutdown.subscribe();

        if self.state.config.rate_limit.enabled {
            let limiter = self.state.rate_limiter.clone();
            let every = Duration::from_secs(self.state.config.rate_limit.sweep_interval_secs);
            shutdown.spawn_background("rate-limit-sweep", sweep_rate_limiter(limiter, every));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        shutdown.drain().await;
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// The router underneath is infallible, so an elapsed deadline is the only
/// error that reaches here.
async fn request_timed_out(err: BoxError) -> ApiError {
    tracing::warn!(error = %err, "Request exceeded its deadline");
    metrics::record_rejection("timeout");
    ApiError::Timeout
}

/// Periodically evict expired rate limit windows.
async fn sweep_rate_limiter(limiter: Arc<RateLimiter>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let removed = limiter.purge_expired();
        metrics::record_rate_limit_keys(limiter.tracked_keys());
        if removed > 0 {
            tracing::debug!(removed, remaining = limiter.tracked_keys(), "Evicted expired rate limit windows");
        }
    }
}
