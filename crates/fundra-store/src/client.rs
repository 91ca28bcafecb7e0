//! Generic CRUD client over the record store's HTTP contract.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::retry::retry_read;

/// Configuration for a [`RecordStore`] client.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the record store (e.g. `http://localhost:8090`).
    pub base_url: String,
    /// Per-request timeout in seconds (default: 10).
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Create a configuration with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 10,
        }
    }

    /// Builder: override the per-request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Async client for the platform's generic record store.
///
/// Cheap to clone; all clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct RecordStore {
    client: reqwest::Client,
    base_url: String,
}

impl RecordStore {
    /// Build a client from configuration.
    ///
    /// Validates the base URL up front so a misconfigured deployment fails
    /// at construction, not on the first rule run.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url).map_err(|e| StoreError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::ServiceUnavailable {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, base_url })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{collection}", self.base_url)
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.base_url)
    }

    fn send_error(operation: &str, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout {
                operation: operation.to_string(),
            }
        } else {
            StoreError::ServiceUnavailable {
                reason: format!("{operation}: {e}"),
            }
        }
    }

    /// Map a non-success response into the error taxonomy. `not_found` is
    /// the error to use for a 404 (it differs per operation).
    async fn check_status(
        resp: reqwest::Response,
        operation: &str,
        not_found: impl FnOnce() -> StoreError,
    ) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        let body = resp.text().await.unwrap_or_default();
        let body: String = body.chars().take(200).collect();
        if status.is_server_error() {
            Err(StoreError::ServiceUnavailable {
                reason: format!("{operation}: HTTP {status} — {body}"),
            })
        } else {
            Err(StoreError::Rejected {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn decode<T: DeserializeOwned>(
        resp: reqwest::Response,
        operation: &str,
    ) -> Result<T, StoreError> {
        resp.json().await.map_err(|e| StoreError::Decode {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }

    /// List records in a collection, optionally narrowed by equality
    /// filters (`?field=value&...`).
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<T>, StoreError> {
        let url = self.collection_url(collection);
        let operation = format!("GET {collection}");
        let resp = retry_read(|| self.client.get(&url).query(filters).send())
            .await
            .map_err(|e| Self::send_error(&operation, e))?;
        let resp = Self::check_status(resp, &operation, || StoreError::NotFound {
            collection: collection.to_string(),
            id: String::new(),
        })
        .await?;
        Self::decode(resp, &operation).await
    }

    /// Fetch a single record; 404 is an error.
    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<T, StoreError> {
        match self.try_get(collection, id).await? {
            Some(record) => Ok(record),
            None => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    /// Fetch a single record; 404 is `None`.
    pub async fn try_get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        let url = self.record_url(collection, id);
        let operation = format!("GET {collection}/{id}");
        let resp = retry_read(|| self.client.get(&url).send())
            .await
            .map_err(|e| Self::send_error(&operation, e))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = Self::check_status(resp, &operation, || StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })
        .await?;
        Ok(Some(Self::decode(resp, &operation).await?))
    }

    /// Create a record; the store assigns the id and returns the full
    /// record. Not retried — see the module docs.
    pub async fn create<B: Serialize, T: DeserializeOwned>(
        &self,
        collection: &str,
        record: &B,
    ) -> Result<T, StoreError> {
        let url = self.collection_url(collection);
        let operation = format!("POST {collection}");
        let resp = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| Self::send_error(&operation, e))?;
        let resp = Self::check_status(resp, &operation, || StoreError::NotFound {
            collection: collection.to_string(),
            id: String::new(),
        })
        .await?;
        Self::decode(resp, &operation).await
    }

    /// Replace a record wholesale. Not retried.
    pub async fn replace<B: Serialize, T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        record: &B,
    ) -> Result<T, StoreError> {
        let url = self.record_url(collection, id);
        let operation = format!("PUT {collection}/{id}");
        let resp = self
            .client
            .put(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| Self::send_error(&operation, e))?;
        let resp = Self::check_status(resp, &operation, || StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })
        .await?;
        Self::decode(resp, &operation).await
    }

    /// Merge the given fields into a record. Not retried.
    pub async fn patch<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        fields: &serde_json::Value,
    ) -> Result<T, StoreError> {
        let url = self.record_url(collection, id);
        let operation = format!("PATCH {collection}/{id}");
        let resp = self
            .client
            .patch(&url)
            .json(fields)
            .send()
            .await
            .map_err(|e| Self::send_error(&operation, e))?;
        let resp = Self::check_status(resp, &operation, || StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })
        .await?;
        Self::decode(resp, &operation).await
    }
}
