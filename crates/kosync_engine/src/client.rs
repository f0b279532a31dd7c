//! Blocking `reqwest` implementation of [`HttpClient`].

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::http::{HttpClient, HttpResponse};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Network HTTP client.
///
/// The timeout bounds each whole exchange: connecting, sending the request
/// and reading the response body.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Creates a client with the given timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| SyncError::transport("failed to build HTTP client", false, e))?;
        Ok(Self { client })
    }

    /// Creates a client from the timeout and user agent in `config`.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        Self::new(config.timeout, &config.user_agent)
    }
}

impl HttpClient for ReqwestClient {
    fn post_json(&self, url: &str, bearer_token: &str, body: Vec<u8>) -> SyncResult<HttpResponse> {
        let response = self
            .client
            .post(url)
            .bearer_auth(bearer_token)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;
        Ok(HttpResponse::new(response.status().as_u16(), response))
    }

    fn get(&self, url: &str, bearer_token: &str) -> SyncResult<HttpResponse> {
        let response = self.client.get(url).bearer_auth(bearer_token).send()?;
        Ok(HttpResponse::new(response.status().as_u16(), response))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out"
        } else if err.is_connect() {
            "could not connect to server"
        } else if err.is_redirect() {
            "too many redirects"
        } else if err.is_builder() {
            "invalid request"
        } else {
            "request failed"
        };
        let retryable = !err.is_builder() && !err.is_redirect();
        SyncError::transport(message, retryable, err)
    }
}
