//! Process-local store for development and tests.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::ingest::{CookieRecord, NewCookieRecord, RecordId};
use crate::storage::{IngestionStore, StoreError, StoreResult};

/// Records kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<CookieRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("memory store lock poisoned".to_string())
}

#[async_trait]
impl IngestionStore for MemoryStore {
    async fn insert(&self, record: NewCookieRecord) -> StoreResult<RecordId> {
        let id = RecordId(Uuid::new_v4().to_string());
        let stored = record.stamp(id.clone(), Utc::now());

        self.records.write().map_err(poisoned)?.push(stored);
        Ok(id)
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<CookieRecord>> {
        let records = self.records.read().map_err(poisoned)?;

        // Newest insert first, then a stable sort keeps that order for equal timestamps.
        let mut newest: Vec<CookieRecord> = records.iter().rev().cloned().collect();
        newest.sort_by(|a, b| b.collected_at.cmp(&a.collected_at));
        newest.truncate(limit);

        Ok(newest)
    }

    async fn ping(&self) -> StoreResult<()> {
        drop(self.records.read().map_err(poisoned)?);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn new_record(site: &str) -> NewCookieRecord {
        NewCookieRecord {
            site_identifier: site.to_string(),
            cookies: vec![json!({"name": "a", "value": "1"})],
            collected_at: None,
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = MemoryStore::new();
        assert!(store.recent(50).await.unwrap().is_empty());
        assert!(store.is_empty());
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_insert_stamps_time() {
        let store = MemoryStore::new();
        let before = Utc::now();
        let id = store.insert(new_record("example.com")).await.unwrap();

        let records = store.recent(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].site_identifier, "example.com");
        assert!(records[0].collected_at >= before);
    }

    #[tokio::test]
    async fn test_identical_inserts_are_distinct() {
        let store = MemoryStore::new();
        let a = store.insert(new_record("example.com")).await.unwrap();
        let b = store.insert(new_record("example.com")).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_recent_order_and_limit() {
        let store = MemoryStore::new();
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        // Insert out of chronological order
        for offset in [5, 1, 9, 3, 7] {
            let mut record = new_record(&format!("site-{}", offset));
            record.collected_at = Some(base + Duration::minutes(offset));
            store.insert(record).await.unwrap();
        }

        let records = store.recent(3).await.unwrap();
        let sites: Vec<_> = records.iter().map(|r| r.site_identifier.as_str()).collect();
        assert_eq!(sites, vec!["site-9", "site-7", "site-5"]);
    }

    #[tokio::test]
    async fn test_ties_newest_insert_first() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        for site in ["first", "second"] {
            let mut record = new_record(site);
            record.collected_at = Some(at);
            store.insert(record).await.unwrap();
        }

        let records = store.recent(10).await.unwrap();
        assert_eq!(records[0].site_identifier, "second");
        assert_eq!(records[1].site_identifier, "first");
    }

    #[tokio::test]
    async fn test_ping_after_writes() {
        let store = MemoryStore::new();
        store.insert(new_record("example.com")).await.unwrap();
        assert!(store.ping().await.is_ok());
        // Ping must not hold the lock past its return
        store.insert(new_record("example.com")).await.unwrap();
        assert_eq!(store.len(), 2);
    }
}
