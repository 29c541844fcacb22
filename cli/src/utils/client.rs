use anyhow::{anyhow, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const API_PREFIX: &str = "/api/v1";

/// Thin client for the Trellis JSON API.
///
/// Unwraps the `{"success": true, "data": ...}` envelope and turns error
/// envelopes into `anyhow` errors carrying the server's code and message.
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<Value> {
        self.send(self.http.get(self.endpoint(path)), token).await
    }

    pub async fn post(&self, path: &str, body: &Value, token: Option<&str>) -> Result<Value> {
        self.send(self.http.post(self.endpoint(path)).json(body), token)
            .await
    }

    async fn send(&self, request: RequestBuilder, token: Option<&str>) -> Result<Value> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .with_context(|| format!("Could not reach Trellis at {}", self.base_url))?;
        let status = response.status();
        debug!("Response status: {}", status);

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("Server returned {} with a non-JSON body", status))?;

        unwrap_envelope(body)
    }
}

fn unwrap_envelope(mut body: Value) -> Result<Value> {
    if body["success"].as_bool() == Some(true) {
        return Ok(body["data"].take());
    }

    let error = &body["error"];
    let code = error["code"].as_str().unwrap_or("UNKNOWN");
    let message = error["message"].as_str().unwrap_or("no message");
    match error["reason"].as_str() {
        Some(reason) => Err(anyhow!("{} ({}): {}", code, reason, message)),
        None => Err(anyhow!("{}: {}", code, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_joins_prefix() {
        let client = ApiClient::new("http://localhost:3030/").unwrap();
        assert_eq!(
            client.endpoint("/health"),
            "http://localhost:3030/api/v1/health"
        );
    }

    #[test]
    fn test_unwrap_success() {
        let data = unwrap_envelope(json!({ "success": true, "data": { "id": 1 } })).unwrap();
        assert_eq!(data, json!({ "id": 1 }));
    }

    #[test]
    fn test_unwrap_error() {
        let err = unwrap_envelope(json!({
            "success": false,
            "error": { "code": "FORBIDDEN", "message": "nope", "reason": "not_owner" }
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "FORBIDDEN (not_owner): nope");
    }
}
