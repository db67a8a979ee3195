//! HTTP scenario client for the service under test.
//!
//! Issues requests against the configured base URL, attaching the custom
//! credential header when a token is supplied, and exposes the status code
//! and body to the scenario. Silent by default; request/response lines are
//! logged at `debug!` only.

use crate::models::{ScenarioFailure, truncate};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

/// Custom credential header the service authenticates with.
pub const TOKEN_HEADER: &str = "X-Sona-Token";

/// Status code and raw body of a response from the service under test.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,

    /// Raw body text. JSON endpoints decode lazily via [`ApiResponse::json`];
    /// attachment downloads read it directly.
    pub body: String,
}

impl ApiResponse {
    /// Decodes the body as JSON, failing with an assertion-style message
    /// when the service returned something unparseable.
    pub fn json(&self) -> Result<Value, ScenarioFailure> {
        serde_json::from_str(&self.body).map_err(|e| {
            ScenarioFailure::assertion(format!(
                "response body is not valid JSON ({e}); body: {}",
                truncate(&self.body, 200)
            ))
        })
    }
}

/// HTTP client bound to the base URL of the service under test.
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Issues a GET request.
    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<ApiResponse, ScenarioFailure> {
        self.send(self.http.get(self.url(path)), token).await
    }

    /// Issues a GET request with query parameters.
    pub async fn get_query(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<ApiResponse, ScenarioFailure> {
        self.send(self.http.get(self.url(path)).query(query), token)
            .await
    }

    /// Issues a POST request with a JSON body.
    pub async fn post(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<ApiResponse, ScenarioFailure> {
        self.send(self.http.post(self.url(path)).json(body), token)
            .await
    }

    /// Issues a PUT request with a JSON body.
    pub async fn put(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<ApiResponse, ScenarioFailure> {
        self.send(self.http.put(self.url(path)).json(body), token)
            .await
    }

    /// Issues a DELETE request.
    pub async fn delete(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<ApiResponse, ScenarioFailure> {
        self.send(self.http.delete(self.url(path)), token).await
    }

    /// Uploads a file as multipart form data under the `uploadfile` field,
    /// the field name the attachment endpoint reads.
    pub async fn upload(
        &self,
        path: &str,
        token: Option<&str>,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ApiResponse, ScenarioFailure> {
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("uploadfile", part);
        self.send(self.http.post(self.url(path)).multipart(form), token)
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> Result<ApiResponse, ScenarioFailure> {
        let request = match token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, body_len = body.len(), "response received");

        Ok(ApiResponse { status, body })
    }
}
