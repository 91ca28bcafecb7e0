//! # External Condition Providers
//!
//! An `external-condition` delegates to a pluggable lookup keyed by provider
//! name. Providers are the one place condition evaluation may perform
//! network I/O; each applies its own timeout, and any failure is reported as
//! an error that the evaluator turns into "not met" — never an engine fault.
//!
//! Shipped providers:
//!
//! - `website` — HTTP reachability of the URL named by the condition.
//! - `repo-tag` — tag existence on a source-hosting API (`owner/repo#tag`).
//!
//! Test and fixture setups use [`StaticProvider`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;

/// Caller-supplied context metadata, passed through to lookups.
pub type Metadata = serde_json::Map<String, Value>;

/// A pluggable external condition lookup.
#[async_trait]
pub trait ExternalConditionProvider: Send + Sync {
    /// The name rules reference this provider by.
    fn name(&self) -> &str;

    /// Perform the lookup and return its current value.
    async fn check(&self, condition_name: &str, metadata: &Metadata)
        -> Result<Value, ProviderError>;
}

// ---------------------------------------------------------------------------
// ProviderRegistry
// ---------------------------------------------------------------------------

/// Registry of external condition providers, keyed by name.
///
/// BTreeMap keeps listing deterministic for diagnostics.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn ExternalConditionProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the shipped providers, all using the given
    /// lookup timeout.
    pub fn with_default_providers(timeout: Duration) -> Result<Self, ProviderError> {
        let mut registry = Self::new();
        registry.register(Arc::new(WebsiteProvider::new(timeout)?));
        registry.register(Arc::new(RepoTagProvider::new(
            "https://api.github.com",
            timeout,
        )?));
        Ok(registry)
    }

    /// Register a provider. Replaces any existing provider with the same
    /// name.
    pub fn register(&mut self, provider: Arc<dyn ExternalConditionProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Names of all registered providers.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Dispatch a lookup to the named provider.
    pub async fn check(
        &self,
        provider: &str,
        condition_name: &str,
        metadata: &Metadata,
    ) -> Result<Value, ProviderError> {
        let found = self
            .providers
            .get(provider)
            .ok_or_else(|| ProviderError::UnknownProvider {
                provider: provider.to_string(),
            })?;
        found.check(condition_name, metadata).await
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.provider_names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// WebsiteProvider
// ---------------------------------------------------------------------------

/// Checks whether a URL answers with a success status.
///
/// The condition name is the URL itself; if it does not parse as an absolute
/// URL, the lookup falls back to the `websiteUrl` metadata key.
pub struct WebsiteProvider {
    client: reqwest::Client,
}

impl WebsiteProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::LookupFailed {
                provider: "website".into(),
                condition: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    fn resolve_url(condition_name: &str, metadata: &Metadata) -> Option<String> {
        if is_absolute_url(condition_name) {
            return Some(condition_name.to_string());
        }
        metadata
            .get("websiteUrl")
            .and_then(Value::as_str)
            .map(String::from)
    }
}

fn is_absolute_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

#[async_trait]
impl ExternalConditionProvider for WebsiteProvider {
    fn name(&self) -> &str {
        "website"
    }

    async fn check(
        &self,
        condition_name: &str,
        metadata: &Metadata,
    ) -> Result<Value, ProviderError> {
        let target = Self::resolve_url(condition_name, metadata).ok_or_else(|| {
            ProviderError::LookupFailed {
                provider: "website".into(),
                condition: condition_name.to_string(),
                reason: "no URL in condition name or websiteUrl metadata".into(),
            }
        })?;

        let resp = self.client.get(&target).send().await.map_err(|e| {
            ProviderError::LookupFailed {
                provider: "website".into(),
                condition: condition_name.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Value::Bool(resp.status().is_success()))
    }
}

// ---------------------------------------------------------------------------
// RepoTagProvider
// ---------------------------------------------------------------------------

/// Checks whether a tag exists on a hosted repository.
///
/// Condition names take the form `owner/repo#tag`. Existence is probed via
/// the hosting API's tag-ref endpoint: 200 means the tag exists, 404 means
/// it does not, anything else is a lookup failure.
pub struct RepoTagProvider {
    client: reqwest::Client,
    api_base: String,
}

impl RepoTagProvider {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("fundra-engine")
            .build()
            .map_err(|e| ProviderError::LookupFailed {
                provider: "repo-tag".into(),
                condition: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn parse(condition_name: &str) -> Option<(&str, &str)> {
        let (repo, tag) = condition_name.split_once('#')?;
        if repo.split('/').count() != 2 || tag.is_empty() {
            return None;
        }
        Some((repo, tag))
    }
}

#[async_trait]
impl ExternalConditionProvider for RepoTagProvider {
    fn name(&self) -> &str {
        "repo-tag"
    }

    async fn check(
        &self,
        condition_name: &str,
        _metadata: &Metadata,
    ) -> Result<Value, ProviderError> {
        let (repo, tag) =
            Self::parse(condition_name).ok_or_else(|| ProviderError::LookupFailed {
                provider: "repo-tag".into(),
                condition: condition_name.to_string(),
                reason: "expected owner/repo#tag".into(),
            })?;

        let url = format!("{}/repos/{repo}/git/ref/tags/{tag}", self.api_base);
        let resp = self.client.get(&url).send().await.map_err(|e| {
            ProviderError::LookupFailed {
                provider: "repo-tag".into(),
                condition: condition_name.to_string(),
                reason: e.to_string(),
            }
        })?;

        match resp.status() {
            reqwest::StatusCode::OK => Ok(Value::Bool(true)),
            reqwest::StatusCode::NOT_FOUND => Ok(Value::Bool(false)),
            status => Err(ProviderError::LookupFailed {
                provider: "repo-tag".into(),
                condition: condition_name.to_string(),
                reason: format!("HTTP {status}"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// StaticProvider
// ---------------------------------------------------------------------------

/// A provider answering from a fixed table. For tests and fixtures.
#[derive(Debug, Default)]
pub struct StaticProvider {
    name: String,
    values: BTreeMap<String, Value>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder: set the value returned for a condition name.
    pub fn with_value(mut self, condition_name: impl Into<String>, value: Value) -> Self {
        self.values.insert(condition_name.into(), value);
        self
    }
}

#[async_trait]
impl ExternalConditionProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(
        &self,
        condition_name: &str,
        _metadata: &Metadata,
    ) -> Result<Value, ProviderError> {
        self.values.get(condition_name).cloned().ok_or_else(|| {
            ProviderError::LookupFailed {
                provider: self.name.clone(),
                condition: condition_name.to_string(),
                reason: "no fixture value".into(),
            }
        })
    }
}
