//! Image retrieval for report composition.
//!
//! The composer only sees the [`ImageFetcher`] trait; production uses a
//! blocking reqwest client with a per-request timeout, tests substitute an
//! in-memory fetcher.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("GET {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },
}

/// Retrieves raw image bytes for a URL.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP fetcher backed by a blocking reqwest client.
pub struct HttpImageFetcher {
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpImageFetcher {
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            timeout_secs,
        }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new(crate::config::IMAGE_FETCH_TIMEOUT_SECS)
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                FetchError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}
