//! Configuration loading from disk and the environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::{ServiceConfig, StorageBackend};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value '{}' for environment variable {}", value, var)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment
/// overrides from the process environment, then validate.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without validating it.
pub fn read_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` resolves a variable name; blank values count as unset.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("MONGO_URL") {
        config.storage.url = url;
    }
    if let Some(backend) = get("STORAGE_BACKEND") {
        config.storage.backend = parse_var::<StorageBackend>("STORAGE_BACKEND", &backend)?;
    }
    if let Some(timeout) = get("STORAGE_TIMEOUT_MS") {
        config.storage.timeout_ms = parse_var("STORAGE_TIMEOUT_MS", &timeout)?;
    }
    if let Some(key) = get("API_KEY") {
        config.auth.api_key = key;
    }
    if let Some(origin) = get("ALLOWED_ORIGIN") {
        config.cors.allowed_origin = Some(origin);
    }
    if let Some(addr) = get("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(port) = get("PORT") {
        let port: u16 = parse_var("PORT", &port)?;
        config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
            Ok(mut addr) => {
                addr.set_port(port);
                addr.to_string()
            }
            Err(_) => format!("0.0.0.0:{}", port),
        };
    }
    if let Some(window) = get("RATE_LIMIT_WINDOW_SECS") {
        config.rate_limit.window_secs = parse_var("RATE_LIMIT_WINDOW_SECS", &window)?;
    }
    if let Some(max) = get("RATE_LIMIT_MAX_REQUESTS") {
        config.rate_limit.max_requests = parse_var("RATE_LIMIT_MAX_REQUESTS", &max)?;
    }
    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    Ok(())
}

fn parse_var<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServiceConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("MONGO_URL", "mongodb://db:27017"),
                ("API_KEY", "k3y"),
                ("ALLOWED_ORIGIN", "chrome-extension://abc"),
                ("PORT", "4000"),
                ("RATE_LIMIT_WINDOW_SECS", "30"),
                ("RATE_LIMIT_MAX_REQUESTS", "5"),
                ("STORAGE_TIMEOUT_MS", "250"),
                ("STORAGE_BACKEND", "memory"),
            ]),
        )
        .unwrap();

        assert_eq!(config.storage.url, "mongodb://db:27017");
        assert_eq!(config.auth.api_key, "k3y");
        assert_eq!(config.cors.allowed_origin.as_deref(), Some("chrome-extension://abc"));
        assert_eq!(config.listener.bind_address, "0.0.0.0:4000");
        assert_eq!(config.rate_limit.window_secs, 30);
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.storage.timeout_ms, 250);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_port_keeps_host() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "127.0.0.1:3000".into();
        apply_env_overrides(&mut config, env(&[("PORT", "8088")])).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8088");
    }

    #[test]
    fn test_blank_values_ignored() {
        let mut config = ServiceConfig::default();
        apply_env_overrides(&mut config, env(&[("API_KEY", "   ")])).unwrap();
        assert!(config.auth.api_key.is_empty());
    }

    #[test]
    fn test_bad_number_rejected() {
        let mut config = ServiceConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PORT", .. }));
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_file_then_validate() {
        let path = std::env::temp_dir().join(format!("collector-config-{}.toml", std::process::id()));
        fs::write(
            &path,
            "[auth]\napi_key = \"from-file\"\n[listener]\nbind_address = \"127.0.0.1:3999\"\n",
        )
        .unwrap();

        let config = read_file(&path).unwrap();
        assert_eq!(config.auth.api_key, "from-file");
        assert!(validate_config(&config).is_ok());

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file() {
        let err = read_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
