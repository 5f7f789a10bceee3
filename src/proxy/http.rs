//! HTTP JSON source.

use super::{extract_rows, DataProxy};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::model::RawRow;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

/// Fetches rows with a GET request
#[derive(Debug, Clone)]
pub struct HttpProxy {
    url: String,
    client: Client,
    rows_key: Option<String>,
}

impl HttpProxy {
    /// Build a client with the configured timeout and user agent
    pub fn new(url: impl Into<String>, config: &ProxyConfig) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
            rows_key: config.rows_key.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DataProxy for HttpProxy {
    async fn load(&self) -> Result<Vec<RawRow>, ProxyError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        debug!(url = %self.url, bytes = bytes.len(), "Fetched rows");
        let document: JsonValue = serde_json::from_slice(&bytes)?;
        extract_rows(document, self.rows_key.as_deref())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
