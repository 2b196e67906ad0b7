//! HTTP client for the EDC Management API.

use anyhow::Result;
use edc_common::{EdcError, ErrorCode};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::Value;
use std::time::Duration;

/// Management API prefix appended to the connector base URL.
pub const MANAGEMENT_PATH: &str = "/management/v3";

const API_KEY_HEADER: &str = "X-Api-Key";
const BODY_SNIPPET_LEN: usize = 300;

/// Build the shared HTTP client with the per-request timeout.
pub fn http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("edcctl/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| EdcError::new(ErrorCode::ApiRequestFailed, err.to_string()))?;
    Ok(client)
}

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub method: Method,
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into `ApiUnexpectedStatus`.
    pub fn expect_success(self, step: &str) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(self.unexpected(step).into())
    }

    pub fn unexpected(&self, step: &str) -> EdcError {
        EdcError::new(
            ErrorCode::ApiUnexpectedStatus,
            format!(
                "{step}: {} {} returned HTTP {}: {}",
                self.method,
                self.url,
                self.status,
                snippet(&self.body)
            ),
        )
    }

    /// Parse the body as JSON, raising `ApiMalformedResponse` on failure.
    pub fn json(&self, step: &str) -> Result<Value> {
        serde_json::from_str(&self.body).map_err(|err| {
            EdcError::new(
                ErrorCode::ApiMalformedResponse,
                format!("{step}: response from {} is not JSON ({err}): {}", self.url, snippet(&self.body)),
            )
            .into()
        })
    }
}

fn snippet(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "<empty body>".to_string();
    }
    let mut cut: String = body.chars().take(BODY_SNIPPET_LEN).collect();
    if cut.len() < body.len() {
        cut.push_str("...");
    }
    cut
}

/// Result of a GET on one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Exists,
    Absent,
}

/// One connector's Management API, authenticated with its API key.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ManagementClient {
    pub fn new(http: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Full URL of a Management API path such as `/assets`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{MANAGEMENT_PATH}{path}", self.base_url)
    }

    /// URL of the resource named by `segments`, each percent-encoded as a
    /// single path segment.
    pub fn resource_url(&self, segments: &[&str]) -> Result<String> {
        let invalid = || {
            EdcError::new(
                ErrorCode::ApiRequestFailed,
                format!("invalid connector URL: {}", self.base_url),
            )
        };
        let mut url = Url::parse(&self.endpoint("")).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
    }

    pub async fn get(&self, segments: &[&str]) -> Result<ApiResponse> {
        let url = self.resource_url(segments)?;
        send(self.request(Method::GET, &url), Method::GET, url).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let url = self.endpoint(path);
        send(self.request(Method::POST, &url).json(body), Method::POST, url).await
    }

    /// GET a resource: 200 is `Exists`, 404 is `Absent`, anything else fails.
    pub async fn probe(&self, step: &str, segments: &[&str]) -> Result<Presence> {
        let response = self.get(segments).await?;
        match response.status {
            200 => Ok(Presence::Exists),
            404 => Ok(Presence::Absent),
            _ => Err(response.unexpected(step).into()),
        }
    }

    /// POST and require a 2xx JSON response.
    pub async fn post_json(&self, step: &str, path: &str, body: &Value) -> Result<Value> {
        self.post(path, body).await?.expect_success(step)?.json(step)
    }

    /// GET and require a 2xx JSON response.
    pub async fn get_json(&self, step: &str, segments: &[&str]) -> Result<Value> {
        self.get(segments).await?.expect_success(step)?.json(step)
    }
}

/// GET a data plane endpoint with the EDR token.
pub async fn fetch_with_token(http: &Client, endpoint: &str, token: &str) -> Result<ApiResponse> {
    let builder = http.get(endpoint).header(AUTHORIZATION, token);
    send(builder, Method::GET, endpoint.to_string()).await
}

async fn send(builder: RequestBuilder, method: Method, url: String) -> Result<ApiResponse> {
    let response = builder.send().await.map_err(|err| {
        let kind = if err.is_timeout() {
            "timed out"
        } else if err.is_connect() {
            "connection failed"
        } else {
            "request failed"
        };
        EdcError::new(
            ErrorCode::ApiRequestFailed,
            format!("{method} {url} {kind}: {err}"),
        )
    })?;

    let status = response.status().as_u16();
    let body = response.text().await.map_err(|err| {
        EdcError::new(
            ErrorCode::ApiRequestFailed,
            format!("{method} {url}: failed to read body: {err}"),
        )
    })?;
    tracing::debug!(%method, %url, status, bytes = body.len(), "HTTP exchange");

    Ok(ApiResponse {
        method,
        url,
        status,
        body,
    })
}
