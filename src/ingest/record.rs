//! Cookie record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Store-assigned identifier of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated submission that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCookieRecord {
    /// Host or domain the cookies belong to. Never empty.
    pub site_identifier: String,
    /// Opaque cookie objects, in submission order.
    pub cookies: Vec<Value>,
    /// Caller-supplied collection time, if any.
    pub collected_at: Option<DateTime<Utc>>,
}

impl NewCookieRecord {
    pub fn cookie_count(&self) -> usize {
        self.cookies.len()
    }

    /// Fix the collection time, defaulting to `now`.
    pub fn stamp(self, id: RecordId, now: DateTime<Utc>) -> CookieRecord {
        CookieRecord {
            id,
            site_identifier: self.site_identifier,
            cookies: self.cookies,
            collected_at: self.collected_at.unwrap_or(now),
        }
    }
}

/// A persisted record. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub id: RecordId,
    pub site_identifier: String,
    pub cookies: Vec<Value>,
    pub collected_at: DateTime<Utc>,
}
