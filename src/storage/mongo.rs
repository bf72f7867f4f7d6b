//! MongoDB-backed store.
//!
//! One document per record in a single collection, with a descending index
//! on `collected_at` for the read-back query. The driver connects lazily, so
//! constructing the store succeeds even while the server is unreachable.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::StorageConfig;
use crate::ingest::{CookieRecord, NewCookieRecord, RecordId};
use crate::storage::{IngestionStore, StoreError, StoreResult};

/// On-disk representation of a [`CookieRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub site_identifier: String,
    pub cookies: Vec<Value>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub collected_at: DateTime<Utc>,
}

impl CookieDocument {
    pub fn from_new(record: NewCookieRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: ObjectId::new(),
            site_identifier: record.site_identifier,
            cookies: record.cookies,
            collected_at: record.collected_at.unwrap_or(now),
        }
    }

    pub fn into_record(self) -> CookieRecord {
        CookieRecord {
            id: RecordId(self.id.to_hex()),
            site_identifier: self.site_identifier,
            cookies: self.cookies,
            collected_at: self.collected_at,
        }
    }
}

pub struct MongoStore {
    client: Client,
    database: String,
    collection: Collection<CookieDocument>,
}

impl MongoStore {
    /// Build a client for `config.url`. Does not wait for the server.
    pub async fn connect(config: &StorageConfig) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(&config.url)
            .await
            .map_err(|e| StoreError::Unavailable(format!("invalid connection string: {}", e)))?;

        let deadline = Duration::from_millis(config.timeout_ms);
        options.server_selection_timeout = Some(deadline);
        options.connect_timeout = Some(deadline);
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options).map_err(map_mongo_error)?;
        let collection = client
            .database(&config.database)
            .collection::<CookieDocument>(&config.collection);

        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "MongoDB client created"
        );

        Ok(Self {
            client,
            database: config.database.clone(),
            collection,
        })
    }

    /// Create the `collected_at` index used by [`IngestionStore::recent`].
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "collected_at": -1 })
            .build();
        self.collection
            .create_index(index)
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }
}

fn map_mongo_error(err: MongoError) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::ConnectionPoolCleared { .. } => {
            StoreError::Unavailable(err.to_string())
        }
        ErrorKind::BsonDeserialization(_) => StoreError::Corrupt(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}

#[async_trait]
impl IngestionStore for MongoStore {
    async fn insert(&self, record: NewCookieRecord) -> StoreResult<RecordId> {
        let document = CookieDocument::from_new(record, Utc::now());
        let id = RecordId(document.id.to_hex());

        self.collection
            .insert_one(&document)
            .await
            .map_err(map_mongo_error)?;

        Ok(id)
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<CookieRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "collected_at": -1, "_id": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
            .map_err(map_mongo_error)?;

        let documents: Vec<CookieDocument> = cursor.try_collect().await.map_err(map_mongo_error)?;
        Ok(documents.into_iter().map(CookieDocument::into_record).collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn prepare(&self) -> StoreResult<()> {
        self.ensure_indexes().await
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}
