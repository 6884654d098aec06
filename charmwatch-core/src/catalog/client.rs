//! Charm store HTTP client
//!
//! Read-only GETs against the charm store v5 API. Upstream failures are
//! reported as absent data rather than errors; only a malformed body on a
//! successful changes-feed response is fatal.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, error};

use super::types::{ChangeRecord, PackageId, Promulgation, PromulgatedResponse};
use crate::config::CatalogConfig;
use crate::error::CatalogError;

/// Source of catalog data for a report run
///
/// Implementations own their transport and timeout handling.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch packages published on `date`.
    ///
    /// `Ok(None)` means the feed is unavailable for that date.
    async fn fetch_changes(
        &self,
        date: NaiveDate,
    ) -> Result<Option<Vec<ChangeRecord>>, CatalogError>;

    /// Look up whether `id` is promulgated. Failed lookups yield `Unknown`.
    async fn fetch_promulgation(&self, id: &PackageId) -> Promulgation;

    /// Source identifier for logging
    fn name(&self) -> &'static str;
}

/// reqwest-backed client for the public charm store
pub struct CharmStoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl CharmStoreClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("charmwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(CatalogError::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn changes_url(&self) -> String {
        format!("{}/changes/published", self.base_url)
    }

    pub(crate) fn promulgated_url(&self, id: &PackageId) -> String {
        format!("{}/{}/meta/promulgated", self.base_url, id)
    }

    /// GET `url`, returning the body of a success response.
    ///
    /// Transport errors and non-success statuses are logged and collapse to
    /// `None`.
    async fn get_body(&self, url: &str, query: &[(&str, String)]) -> Option<String> {
        debug!("Fetching {}", url);

        let response = match self.client.get(url).query(query).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Request to {} failed: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!("Request to {} failed: HTTP {}", url, status);
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                error!("Failed to read response body from {}: {}", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl CatalogSource for CharmStoreClient {
    async fn fetch_changes(
        &self,
        date: NaiveDate,
    ) -> Result<Option<Vec<ChangeRecord>>, CatalogError> {
        let url = self.changes_url();
        let day = date.format("%Y-%m-%d").to_string();
        let query = [("start", day.clone()), ("stop", day)];

        let Some(body) = self.get_body(&url, &query).await else {
            return Ok(None);
        };

        let records: Vec<ChangeRecord> = serde_json::from_str(&body)
            .map_err(|source| CatalogError::MalformedResponse { url, source })?;

        debug!("Changes feed for {} lists {} packages", date, records.len());
        Ok(Some(records))
    }

    async fn fetch_promulgation(&self, id: &PackageId) -> Promulgation {
        let url = self.promulgated_url(id);

        let Some(body) = self.get_body(&url, &[]).await else {
            return Promulgation::Unknown;
        };

        match serde_json::from_str::<PromulgatedResponse>(&body) {
            Ok(parsed) => Promulgation::from(parsed.promulgated),
            Err(e) => {
                error!("Malformed promulgation response from {}: {}", url, e);
                Promulgation::Unknown
            }
        }
    }

    fn name(&self) -> &'static str {
        "charmstore"
    }
}
