// # HTTP Inventory Source
//
// This crate provides the HTTP-based inventory source for the
// synchronization agent.
//
// ## Purpose
//
// Fetches the node/service inventory export as a JSON array and
// extracts the raw message carried at `parameters.message` on each
// entry. Every other field in the response is opaque and ignored.
//
// ## Transport Behavior
//
// - Each request carries `Connection: close`: polling intervals are
//   long and a pooled socket can go stale between cycles.
// - The client carries a bounded request timeout, so one hung fetch
//   cannot delay shutdown indefinitely.
// - Any transport error, non-200 status, or unparsable body is
//   returned as `Err`; the engine degrades it to an empty cycle and
//   the next tick retries naturally.
//
// ## Response Shape
//
// The body is deserialized into the typed shape
// `[{ "parameters": { "message": "<string>" } }]`. A shape mismatch on
// either field (missing, null, wrong type) is treated as "field
// absent" and the entry is skipped silently, never failing the cycle.

use invsync_core::traits::InventorySource;
use invsync_core::{Error, Result};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Default request timeout for inventory fetches
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// One entry of the inventory export. Fields beyond `parameters` are
/// ignored; a malformed `parameters` value deserializes to `None`.
#[derive(Debug, Deserialize)]
struct InventoryEntry {
    #[serde(default, deserialize_with = "lenient")]
    parameters: Option<Parameters>,
}

/// The nested parameter object carrying the raw message.
#[derive(Debug, Deserialize)]
struct Parameters {
    #[serde(default, deserialize_with = "lenient")]
    message: Option<String>,
}

/// Deserialize a field leniently: any shape mismatch becomes `None`
/// instead of a parse failure, so one odd entry cannot poison the
/// whole response.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// HTTP-based inventory source
pub struct HttpInventorySource {
    /// Inventory export endpoint
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpInventorySource {
    /// Create a new HTTP inventory source with the default timeout
    ///
    /// # Parameters
    ///
    /// - `url`: inventory export endpoint
    pub fn new(url: String) -> Self {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: String, timeout: Duration) -> Self {
        Self {
            url,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Extract raw messages from deserialized entries.
    fn extract_messages(entries: Vec<InventoryEntry>) -> Vec<String> {
        entries
            .into_iter()
            .filter_map(|entry| entry.parameters.and_then(|parameters| parameters.message))
            .collect()
    }
}

/// The endpoint contract is exact: only 200 carries the inventory
/// export. Other 2xx codes (204 included) mean no usable body.
fn status_is_expected(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::OK
}

#[async_trait::async_trait]
impl InventorySource for HttpInventorySource {
    async fn fetch(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::CONNECTION, "close")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("HTTP request failed: {}", e);
                Error::http(format!("request failed: {}", e))
            })?;

        if !status_is_expected(response.status()) {
            tracing::warn!("HTTP error: {}", response.status());
            return Err(Error::http(format!(
                "inventory endpoint returned {}",
                response.status()
            )));
        }

        let entries: Vec<InventoryEntry> = response
            .json()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to read response: {}", e);
                Error::source(format!("unparsable inventory response: {}", e))
            })?;

        Ok(Self::extract_messages(entries))
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
