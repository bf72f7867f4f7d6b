use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a `POST /collect` submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectRequest {
    pub site_identifier: String,
    pub cookies: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<String>,
}

/// Successful `POST /collect` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectReceipt {
    pub success: bool,
    pub count: usize,
    pub id: String,
}

/// A record as returned by `GET /logs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub site_identifier: String,
    pub cookies: Vec<Value>,
    pub collected_at: String,
}

pub struct CollectorClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    origin: Option<String>,
}

impl CollectorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .no_proxy()
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            origin: None,
        }
    }

    /// Send `x-api-key` on every request.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    /// Send an `Origin` header on every request, as a browser would.
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    fn decorate(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }
        if let Some(origin) = &self.origin {
            builder = builder.header("Origin", origin);
        }
        builder
    }

    /// Submit a record and decode the receipt.
    pub async fn collect(&self, req: &CollectRequest) -> Result<CollectReceipt, Box<dyn std::error::Error>> {
        let resp = self.post_collect(&serde_json::to_value(req)?).await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("Collector returned error status {}: {}", status, text).into());
        }

        Ok(serde_json::from_str::<CollectReceipt>(&text)?)
    }

    /// Fetch the most recent records, newest first.
    pub async fn recent(&self) -> Result<Vec<StoredRecord>, Box<dyn std::error::Error>> {
        let resp = self.get_logs().await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("Collector returned error status {}: {}", status, text).into());
        }

        Ok(serde_json::from_str::<Vec<StoredRecord>>(&text)?)
    }

    /// POST an arbitrary JSON body to `/collect` and hand back the raw response.
    pub async fn post_collect(&self, body: &Value) -> Result<Response, reqwest::Error> {
        self.decorate(self.client.post(format!("{}/collect", self.base_url)))
            .json(body)
            .send()
            .await
    }

    pub async fn get_logs(&self) -> Result<Response, reqwest::Error> {
        self.decorate(self.client.get(format!("{}/logs", self.base_url)))
            .send()
            .await
    }

    /// Send a CORS preflight for `path`.
    pub async fn preflight(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.decorate(
            self.client
                .request(reqwest::Method::OPTIONS, format!("{}{}", self.base_url, path)),
        )
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type, x-api-key")
        .send()
        .await
    }

    pub async fn liveness(&self) -> Result<String, reqwest::Error> {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await?
            .text()
            .await
    }
}
