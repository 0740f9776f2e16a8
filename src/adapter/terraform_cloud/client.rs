//! Terraform Cloud HTTP Client
//!
//! API呼び出しの抽象化と reqwest 実装

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

#[cfg(test)]
use mockall::automock;

use crate::domain::errors::RemoteStateError;

const JSON_API: &str = "application/vnd.api+json";

/// Trait for Terraform Cloud API calls
/// This enables mocking in tests while using reqwest in production
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TfcApi: Send + Sync {
    /// GET an API path and return the JSON body
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, RemoteStateError>;

    /// POST to an API path with an optional JSON body, ignoring the response body
    async fn post_json(&self, path: &str, body: Option<Value>) -> Result<(), RemoteStateError>;

    /// Download an absolute URL (hosted state) with the API token
    async fn download(&self, url: &str) -> Result<Vec<u8>, RemoteStateError>;
}

/// reqwest-backed client
///
/// A missing token is reported by the first call, so commands that never
/// reach the API (e.g. planning keys from a manifest) work without one.
pub struct TfcHttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl TfcHttpClient {
    /// Build a client for `address` (e.g. `https://app.terraform.io`)
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStateError::Transport`] when the HTTP client cannot be built.
    pub fn new(address: &str, token: Option<String>) -> Result<Self, RemoteStateError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_API));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("tfshift/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RemoteStateError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: format!("{}/api/v2", address.trim_end_matches('/')),
            token: token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, RemoteStateError> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| RemoteStateError::Unauthorized("TFC_TOKEN is not set".to_string()))?;
        Ok(request.header(AUTHORIZATION, format!("Bearer {}", token)))
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[async_trait]
impl TfcApi for TfcHttpClient {
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, RemoteStateError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self
            .authorized(self.client.get(&url).query(query))?
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteStateError::Transport(format!("invalid JSON from {url}: {e}")))
    }

    async fn post_json(&self, path: &str, body: Option<Value>) -> Result<(), RemoteStateError> {
        let url = self.url(path);
        debug!("POST {}", url);
        let mut request = self.authorized(self.client.post(&url))?;
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, JSON_API)
                .body(body.to_string());
        }
        let response = request.send().await.map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, RemoteStateError> {
        debug!("GET {}", url);
        let response = self
            .authorized(self.client.get(url))?
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

fn transport_error(e: reqwest::Error) -> RemoteStateError {
    RemoteStateError::Transport(e.to_string())
}

async fn check_status(response: Response) -> Result<Response, RemoteStateError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status.as_u16(), &body))
}

/// Map a non-success HTTP status to a domain error
pub fn classify_status(status: u16, body: &str) -> RemoteStateError {
    let message = error_detail(body).unwrap_or_else(|| format!("HTTP {status}"));
    match status {
        401 | 403 => RemoteStateError::Unauthorized(message),
        404 => RemoteStateError::NotFound(message),
        409 => RemoteStateError::Conflict(message),
        _ => RemoteStateError::Api { status, message },
    }
}

/// Extract `errors[0].detail` (or `title`) from a JSON:API error body
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("errors")?.as_array()?.first()?;
    error
        .get("detail")
        .or_else(|| error.get("title"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
