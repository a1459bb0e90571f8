//! HTTP GET with a fixed number of immediate retries.

use crate::{config::Config, errors::IcpError};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub struct RetryingFetcher {
    client: reqwest::Client,
}

impl RetryingFetcher {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self, IcpError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self { client: builder.build()? })
    }

    pub fn from_config(config: &Config) -> Result<Self, IcpError> {
        Self::new(&config.user_agent, config.request_timeout())
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// A transport error or a body that is not JSON uses up one attempt; the
    /// request is repeated straight away until `max_attempts` attempts have
    /// been made (at least one). The last error is returned on exhaustion.
    pub async fn fetch(&self, url: &str, max_attempts: usize) -> Result<Value, IcpError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.fetch_once(url).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => {
                    warn!(url, attempts = attempt, error = %e, "Request failed after retries");
                    return Err(e);
                }
                Err(e) => {
                    debug!(url, attempt, max_attempts, error = %e, "Request failed, retrying");
                    attempt += 1;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<Value, IcpError> {
        let response = self.client.get(url).send().await?;
        debug!("{} answered with status {}", url, response.status());

        // decode regardless of status; the provider parser decides what counts as data
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
