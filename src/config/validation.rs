//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. Every problem is reported,
//! not just the first.

use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.auth.api_key.trim().is_empty() {
        errors.push(ValidationError::new("auth.api_key", "must be set"));
    }

    if let Some(origin) = config.cors.allowed_origin.as_deref() {
        if let Err(msg) = check_origin(origin) {
            errors.push(ValidationError::new("cors.allowed_origin", msg));
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be > 0"));
        }
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::new("rate_limit.max_requests", "must be > 0"));
        }
        if config.rate_limit.sweep_interval_secs == 0 {
            errors.push(ValidationError::new("rate_limit.sweep_interval_secs", "must be > 0"));
        }
    }

    if config.storage.timeout_ms == 0 {
        errors.push(ValidationError::new("storage.timeout_ms", "must be > 0"));
    }
    if config.storage.recent_limit == 0 {
        errors.push(ValidationError::new("storage.recent_limit", "must be > 0"));
    }
    if config.storage.database.is_empty() {
        errors.push(ValidationError::new("storage.database", "must not be empty"));
    }
    if config.storage.collection.is_empty() {
        errors.push(ValidationError::new("storage.collection", "must not be empty"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An origin is `scheme://host[:port]`, nothing more.
fn check_origin(origin: &str) -> Result<(), String> {
    let trimmed = origin.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err("must not be empty when set".to_string());
    }
    let url = url::Url::parse(trimmed).map_err(|e| format!("'{}' is not a valid origin: {}", origin, e))?;
    if url.host_str().is_none() {
        return Err(format!("'{}' has no host", origin));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(format!("'{}' must not contain a path", origin));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(format!("'{}' must not contain a query or fragment", origin));
    }
    Ok(())
}
