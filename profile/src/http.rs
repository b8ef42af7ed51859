//! HTTP profile fetcher with a hard per-request timeout and bounded retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::bootstrap::parse_profile_page;
use crate::error::FetchError;
use crate::profile::ExternalProfile;
use crate::url::ProfileUrl;
use crate::ProfileFetcher;

/// Connection timeout, separate from the whole-request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetch tuning, loadable from the daemon's TOML config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Extra attempts after the first one, on timeout or connection errors only.
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retries: 3,
            retry_delay_ms: 1000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

/// Fetches profile pages over HTTPS and parses the embedded profile data.
pub struct HttpProfileFetcher {
    http_client: reqwest::Client,
    config: FetchConfig,
}

impl HttpProfileFetcher {
    /// Build the client. Fails rather than falling back to a client without
    /// the configured timeouts.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// GET the page body, retrying transient failures.
    ///
    /// A non-200 status is not retried: the server answered, and asking again
    /// will not change a 404 into a profile.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = self
                .http_client
                .get(url)
                .header(
                    reqwest::header::ACCEPT,
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                )
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
                .send()
                .await;

            let err = match result {
                Ok(response) => {
                    let status = response.status();
                    if status != reqwest::StatusCode::OK {
                        return Err(FetchError::Status(status.as_u16()));
                    }
                    return response
                        .text()
                        .await
                        .map_err(|e| FetchError::Network(format!("reading body: {e}")));
                }
                Err(e) => e,
            };

            let retryable = err.is_timeout() || err.is_connect() || err.is_request();
            if !retryable || attempt > self.config.retries {
                return Err(if err.is_timeout() {
                    FetchError::Timeout { attempts: attempt }
                } else {
                    FetchError::Network(err.to_string())
                });
            }

            tracing::warn!(
                url,
                attempt,
                max = self.config.retries,
                error = %err,
                "profile fetch failed, retrying"
            );
            tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
        }
    }
}

#[async_trait]
impl ProfileFetcher for HttpProfileFetcher {
    async fn fetch_profile(&self, url: &ProfileUrl) -> Result<ExternalProfile, FetchError> {
        let html = self.fetch_page(url.as_str()).await?;
        let profile = parse_profile_page(&html)?;
        tracing::debug!(
            url = %url,
            username = %profile.username,
            external_id = profile.external_id,
            "fetched external profile"
        );
        Ok(profile)
    }
}
