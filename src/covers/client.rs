//! Cover image lookup against an external book-cover metadata service.
//!
//! The lookup is best-effort enrichment: any failure degrades to a local
//! placeholder path and never blocks or fails book creation.

use anyhow::Result;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Served by the route layer out of the static directory.
pub const DEFAULT_COVER_PATH: &str = "static/images/empty.jpg";

/// Errors that can occur when talking to the cover service.
#[derive(Debug, Error)]
pub enum CoverError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {0})")]
    Api(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Result of a cover lookup. Never an error: a failed lookup carries the
/// placeholder path plus a warning for the caller to surface.
#[derive(Debug, Clone)]
pub struct CoverOutcome {
    pub url: String,
    pub warning: Option<String>,
}

/// Trait for cover lookup backends.
pub trait CoverLookup: Send + Sync {
    /// Resolve the cover image URL for an ISBN, falling back to
    /// [`DEFAULT_COVER_PATH`] on any failure.
    fn cover_url(&self, isbn: &str) -> CoverOutcome;
}

/// Cover lookup over the RapidAPI book-cover endpoint.
///
/// One attempt per lookup, bounded by a request timeout; no retries. The
/// store calls this synchronously while adding a book.
pub struct CoverApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_host: Option<String>,
}

impl CoverApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        api_host: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
            api_host,
        })
    }

    fn request(&self, isbn: &str) -> Result<String, CoverError> {
        let mut request = self
            .client
            .get(&self.base_url)
            .query(&[("languageCode", "en"), ("isbn", isbn)]);
        if let Some(key) = &self.api_key {
            request = request.header("X-RapidAPI-Key", key);
        }
        if let Some(host) = &self.api_host {
            request = request.header("X-RapidAPI-Host", host);
        }

        debug!(isbn = %isbn, "Sending cover lookup request");

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                CoverError::Timeout
            } else {
                CoverError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(CoverError::Api(status.as_u16()));
        }

        let payload: CoverPayload = response
            .json()
            .map_err(|e| CoverError::InvalidResponse(e.to_string()))?;
        Ok(payload.url)
    }
}

impl CoverLookup for CoverApiClient {
    fn cover_url(&self, isbn: &str) -> CoverOutcome {
        match self.request(isbn) {
            Ok(url) => CoverOutcome { url, warning: None },
            Err(err) => {
                warn!("Cover lookup failed for ISBN {}: {}", isbn, err);
                CoverOutcome {
                    url: DEFAULT_COVER_PATH.to_string(),
                    warning: Some(format!(
                        "Cover lookup failed ({}), using placeholder image",
                        err
                    )),
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CoverPayload {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> CoverApiClient {
        // Port 1 is reserved and nothing listens there; connection fails fast.
        CoverApiClient::new(
            "http://127.0.0.1:1/cover/url",
            None,
            None,
            Duration::from_millis(500),
        )
        .unwrap()
    }

    #[test]
    fn unreachable_service_falls_back_to_placeholder() {
        let client = unreachable_client();
        let outcome = client.cover_url("1234567890123");
        assert_eq!(outcome.url, DEFAULT_COVER_PATH);
        let warning = outcome.warning.unwrap();
        assert!(warning.contains("placeholder"));
    }

    #[test]
    fn payload_decodes_url_field() {
        let payload: CoverPayload =
            serde_json::from_str(r#"{"url": "https://img.test/cover.jpg"}"#).unwrap();
        assert_eq!(payload.url, "https://img.test/cover.jpg");
    }

    #[test]
    fn payload_without_url_field_is_rejected() {
        let result = serde_json::from_str::<CoverPayload>(r#"{"image": "x"}"#);
        assert!(result.is_err());
    }
}
