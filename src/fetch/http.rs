//! HTTP body fetcher
//!
//! Treats the key as a URL and returns the response body. `ureq` is a
//! blocking client, so each request runs on the blocking pool.

use crate::config::schema::FetchConfig;
use crate::error::{FetchError, Outcome};
use crate::fetch::Fetcher;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// GETs the key as a URL and returns the body bytes
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher from config
    pub fn new(config: &FetchConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(config.timeout_secs.map(Duration::from_secs))
            .build()
            .into();
        Self { agent }
    }

    fn get_body(agent: &ureq::Agent, url: &str) -> Result<Vec<u8>, ureq::Error> {
        let mut response = agent.get(url).call()?;
        response.body_mut().read_to_vec()
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    type Value = Arc<Vec<u8>>;

    async fn fetch(&self, key: &str) -> Outcome<Self::Value> {
        let agent = self.agent.clone();
        let url = key.to_string();

        debug!("GET {}", url);
        let body = tokio::task::spawn_blocking(move || Self::get_body(&agent, &url))
            .await
            .map_err(|e| FetchError::failed(key, format!("fetch task failed: {}", e)))?
            .map_err(|e| FetchError::failed(key, e))?;

        debug!("GET {} returned {} bytes", key, body.len());
        Ok(Arc::new(body))
    }
}
