//! Structural validation of `/collect` payloads.
//!
//! The site identifier has gone by several names in deployed extension
//! builds; `site_identifier` is canonical and the older names are accepted
//! as aliases. Cookie elements are opaque and not inspected.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ingest::record::NewCookieRecord;

/// Canonical name of the site field.
pub const SITE_FIELD: &str = "site_identifier";

/// Legacy names accepted for the site field, checked in order.
pub const SITE_FIELD_ALIASES: [&str; 3] = ["host", "domain", "hostname"];

pub const COOKIES_FIELD: &str = "cookies";
pub const COLLECTED_AT_FIELD: &str = "collected_at";

/// Why a payload was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("body is not valid JSON")]
    NotJson,

    #[error("body must be a JSON object")]
    NotObject,

    #[error("site_identifier is missing")]
    MissingSite,

    #[error("site_identifier must be a non-empty string")]
    InvalidSite,

    #[error("cookies is missing")]
    MissingCookies,

    #[error("cookies must be an array")]
    CookiesNotArray,

    #[error("collected_at must be an RFC 3339 timestamp")]
    InvalidTimestamp,
}

/// Parse and validate a raw request body.
pub fn validate_payload(body: &[u8]) -> Result<NewCookieRecord, PayloadError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| PayloadError::NotJson)?;
    validate_value(value)
}

/// Validate an already-parsed body.
pub fn validate_value(value: Value) -> Result<NewCookieRecord, PayloadError> {
    let Value::Object(mut fields) = value else {
        return Err(PayloadError::NotObject);
    };

    let site_identifier = take_site(&fields)?;

    let cookies = match fields.remove(COOKIES_FIELD) {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(PayloadError::CookiesNotArray),
        None => return Err(PayloadError::MissingCookies),
    };

    let collected_at = match fields.get(COLLECTED_AT_FIELD) {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => Some(
            DateTime::parse_from_rfc3339(raw)
                .map_err(|_| PayloadError::InvalidTimestamp)?
                .with_timezone(&Utc),
        ),
        Some(_) => return Err(PayloadError::InvalidTimestamp),
    };

    Ok(NewCookieRecord {
        site_identifier,
        cookies,
        collected_at,
    })
}

fn take_site(fields: &Map<String, Value>) -> Result<String, PayloadError> {
    let raw = std::iter::once(SITE_FIELD)
        .chain(SITE_FIELD_ALIASES)
        .find_map(|name| fields.get(name))
        .ok_or(PayloadError::MissingSite)?;

    match raw {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(PayloadError::InvalidSite),
    }
}
