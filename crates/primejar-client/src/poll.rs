//! Poll-based fallback transport.
//!
//! When no push channel is available, the client falls back to the
//! request gateway: `GET /current` for reads on a fixed interval and
//! `POST /step` for commands. Any transport failure surfaces as a
//! rejected operation; the session treats it as "no update this cycle"
//! and retries on the next scheduled interval.

use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;

/// Wire shape of the gateway's `GET /current` response.
#[derive(Debug, Deserialize)]
struct CurrentBody {
    /// The current counter value.
    currentnumber: u64,
}

/// HTTP client for the request gateway.
#[derive(Debug, Clone)]
pub struct PollSource {
    /// Shared HTTP client.
    client: reqwest::Client,

    /// Gateway base URL, e.g. `http://jar.local:8080`.
    base_url: String,
}

impl PollSource {
    /// Create a poll source for the given gateway base URL.
    ///
    /// A trailing slash on the base URL is tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Fetch the current counter value.
    ///
    /// Idempotent; no side effects on the device.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Request`] if the request fails or the
    /// response is not the expected JSON shape.
    pub async fn fetch_current(&self) -> Result<u64, ClientError> {
        let url = format!("{}/current", self.base_url);
        let body: CurrentBody = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(value = body.currentnumber, "polled current value");
        Ok(body.currentnumber)
    }

    /// Command a step through the gateway.
    ///
    /// Side-effecting and not idempotent: each successful call advances
    /// the shared counter. The response body (an empty JSON object) is
    /// discarded; the landing value arrives through the next poll.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Request`] if the request fails; the caller
    /// must treat the operation as rejected.
    pub async fn command_step(&self) -> Result<(), ClientError> {
        let url = format!("{}/step", self.base_url);
        self.client
            .post(&url)
            .send()
            .await?
            .error_for_status()?;
        debug!("step commanded via gateway");
        Ok(())
    }

    /// Return the gateway base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let source = PollSource::new("http://jar.local:8080///");
        assert_eq!(source.base_url(), "http://jar.local:8080");
    }

    #[test]
    fn bare_base_url_is_kept() {
        let source = PollSource::new("http://10.0.0.7");
        assert_eq!(source.base_url(), "http://10.0.0.7");
    }
}
