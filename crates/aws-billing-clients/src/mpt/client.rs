//! Low level Marketplace Platform REST client
//!
//! Bearer authenticated JSON over HTTPS. Collections are queried with RQL and
//! paginated with `limit`/`offset`.

use aws_billing_core::config::MptConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::Form;
use reqwest::{Client, ClientBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

use super::types::Page;

/// Errors of the Marketplace Platform client
#[derive(Debug, Error)]
pub enum MptError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: request took longer than {0}s")]
    Timeout(u64),

    #[error("HTTP error: status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub struct MptClient {
    http_client: Client,
    base_url: String,
    timeout_secs: u64,
    page_size: u32,
}

impl MptClient {
    /// Create a client for `base_url` (e.g. "https://api.platform.softwareone.com")
    pub fn new(
        base_url: &str,
        api_token: &str,
        timeout_secs: u64,
        page_size: u32,
    ) -> Result<Self, MptError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_token))
            .map_err(|e| MptError::Config(format!("Invalid API token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http_client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| MptError::Connection(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            page_size: page_size.max(1),
        })
    }

    pub fn from_config(config: &MptConfig) -> Result<Self, MptError> {
        Self::new(
            &config.api_base_url,
            &config.api_token,
            config.timeout_secs,
            config.page_size,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/public/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Fetch every item of a collection matching `rql`, following pagination
    #[instrument(skip(self))]
    pub async fn collect<T: DeserializeOwned>(&self, path: &str, rql: &str) -> Result<Vec<T>, MptError> {
        let mut items = Vec::new();
        let mut offset = 0u64;

        loop {
            let url = format!(
                "{}?{}&limit={}&offset={}",
                self.url(path),
                rql,
                self.page_size,
                offset
            );
            let page: Page<T> = self.send(self.http_client.get(&url)).await?;
            let received = page.data.len() as u64;
            let total = page.total();
            items.extend(page.data);
            offset += received;

            debug!("Fetched {} of {:?} items from {}", offset, total, path);

            match total {
                Some(total) if offset < total && received > 0 => continue,
                None if received == u64::from(self.page_size) => continue,
                _ => break,
            }
        }

        Ok(items)
    }

    #[instrument(skip(self, body))]
    pub async fn post<T, R>(&self, path: &str, body: &T) -> Result<R, MptError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(self.http_client.post(self.url(path)).json(body))
            .await
    }

    #[instrument(skip(self, form))]
    pub async fn post_multipart<R: DeserializeOwned>(&self, path: &str, form: Form) -> Result<R, MptError> {
        self.send(self.http_client.post(self.url(path)).multipart(form))
            .await
    }

    /// Multipart POST whose response body is not needed
    #[instrument(skip(self, form))]
    pub async fn post_multipart_empty(&self, path: &str, form: Form) -> Result<(), MptError> {
        let response = self.execute(self.http_client.post(self.url(path)).multipart(form)).await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn send<R: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<R, MptError> {
        let response = self.execute(request).await?;
        let response = Self::check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| MptError::Parse(format!("Failed to read response body: {}", e)))?;

        serde_json::from_str(&body)
            .map_err(|e| MptError::Parse(format!("Failed to parse JSON: {} - Body: {}", e, body)))
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Response, MptError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                MptError::Timeout(self.timeout_secs)
            } else {
                MptError::Connection(e.to_string())
            }
        })
    }

    async fn check_status(response: Response) -> Result<Response, MptError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("MPT HTTP error: status={}, body={}", status, body);
        Err(MptError::Http {
            status: status.as_u16(),
            body,
        })
    }
}
