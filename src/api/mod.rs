//! Thin typed client for the gateway REST API.
//!
//! All traffic funnels through [`ApiClient::request`], which injects the
//! `X-Internal-API-Key` header, logs the raw exchange under the `api_json`
//! target, and folds every failure into [`ApiError`].

pub mod catalog;
pub mod execute;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use thiserror::Error;

use crate::user_config::UserConfig;

pub const API_KEY_HEADER: &str = "X-Internal-API-Key";

/// Response body, parsed according to the response's content type.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

/// The one failure kind callers see: an optional HTTP status plus the
/// parsed or raw body when the server produced one.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status: Option<u16>,
    pub body: Option<Body>,
}

/// Fixed message for network-level failures, deliberately distinct from any
/// HTTP-status error text.
pub const TRANSPORT_ERROR_MESSAGE: &str =
    "Failed to connect to the gateway. Check your connection and ensure the API is running.";

impl ApiError {
    pub fn transport() -> Self {
        Self {
            message: TRANSPORT_ERROR_MESSAGE.to_string(),
            status: None,
            body: None,
        }
    }

    pub fn http(status: u16, reason: &str, body: Body) -> Self {
        Self {
            message: error_message(status, reason, &body),
            status: Some(status),
            body: Some(body),
        }
    }

    pub fn decode(detail: impl Into<String>) -> Self {
        Self {
            message: detail.into(),
            status: None,
            body: None,
        }
    }

    /// Message suitable for direct display on a screen.
    pub fn friendly_message(&self) -> String {
        match self.status {
            Some(401) | Some(403) => {
                "Invalid API key. Check the GATEWAY_API_KEY setting in your environment or config.toml."
                    .to_string()
            }
            Some(500) => "Server error. Please try again later.".to_string(),
            _ => self.message.clone(),
        }
    }
}

/// Pick the error message for a non-2xx response, in order of preference:
/// the body's `message` field, the body itself when it is plain text, else a
/// generated status line.
fn error_message(status: u16, reason: &str, body: &Body) -> String {
    match body {
        Body::Json(Value::Object(map)) => match map.get("message").and_then(Value::as_str) {
            Some(msg) => msg.to_string(),
            None => format!("HTTP {status}: {reason}"),
        },
        Body::Json(Value::String(s)) => s.clone(),
        Body::Text(s) => s.clone(),
        Body::Json(_) => format!("HTTP {status}: {reason}"),
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(config: &UserConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        }
    }

    pub async fn get(&self, endpoint: &str) -> Result<Body, ApiError> {
        self.request(Method::GET, endpoint, None, HeaderMap::new())
            .await
    }

    pub async fn post_json<T: serde::Serialize>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> Result<Body, ApiError> {
        let body = serde_json::to_value(payload)
            .map_err(|e| ApiError::decode(format!("Failed to serialize request body: {e}")))?;
        self.request(Method::POST, endpoint, Some(body), HeaderMap::new())
            .await
    }

    /// Issue one request against the configured base URL.
    ///
    /// `extra_headers` win over the defaults on conflict. The body is parsed
    /// as JSON when the response says it is JSON, as plain text otherwise.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        extra_headers: HeaderMap,
    ) -> Result<Body, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            if let Ok(value) = HeaderValue::from_str(key) {
                headers.insert(API_KEY_HEADER, value);
            } else {
                tracing::warn!("API key contains characters not valid in a header; omitting");
            }
        }
        // Caller-supplied headers override the defaults.
        for (name, value) in extra_headers {
            if let Some(name) = name {
                headers.insert(name, value);
            }
        }

        tracing::info!(
            target: "api_json",
            "request {} {} headers={:?} body={}",
            method,
            url,
            headers,
            body.as_ref().map(serde_json::Value::to_string).unwrap_or_else(|| "none".to_string()),
        );

        let mut builder = self.http.request(method, &url).headers(headers);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!("transport failure for {}: {}", url, e);
            ApiError::transport()
        })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let text = response.text().await.map_err(|e| {
            tracing::warn!("failed reading response body from {}: {}", url, e);
            ApiError::transport()
        })?;

        let parsed = if is_json {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => Body::Json(value),
                Err(_) => Body::Text(text),
            }
        } else {
            Body::Text(text)
        };

        tracing::info!(
            target: "api_json",
            "response {} {} status={} body={}",
            url,
            status.canonical_reason().unwrap_or(""),
            status.as_u16(),
            match &parsed {
                Body::Json(v) => v.to_string(),
                Body::Text(t) => t.clone(),
            },
        );

        if !status.is_success() {
            return Err(ApiError::http(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                parsed,
            ));
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_prefers_body_message_field() {
        let body = Body::Json(json!({"status": "error", "message": "model not found"}));
        let err = ApiError::http(404, "Not Found", body);
        assert_eq!(err.message, "model not found");
        assert_eq!(err.status, Some(404));
    }

    #[test]
    fn error_message_uses_raw_text_body() {
        let err = ApiError::http(502, "Bad Gateway", Body::Text("upstream down".to_string()));
        assert_eq!(err.message, "upstream down");
    }

    #[test]
    fn error_message_falls_back_to_status_line() {
        let err = ApiError::http(404, "Not Found", Body::Json(json!({"code": 42})));
        assert_eq!(err.message, "HTTP 404: Not Found");

        let err = ApiError::http(418, "I'm a teapot", Body::Json(json!([1, 2])));
        assert_eq!(err.message, "HTTP 418: I'm a teapot");
    }

    #[test]
    fn friendly_message_maps_auth_and_server_errors() {
        let unauthorized = ApiError::http(401, "Unauthorized", Body::Text(String::new()));
        assert!(unauthorized.friendly_message().contains("Invalid API key"));

        let forbidden = ApiError::http(403, "Forbidden", Body::Text(String::new()));
        assert!(forbidden.friendly_message().contains("Invalid API key"));

        let server = ApiError::http(500, "Internal Server Error", Body::Text(String::new()));
        assert_eq!(server.friendly_message(), "Server error. Please try again later.");

        let other = ApiError::http(404, "Not Found", Body::Text("no such route".to_string()));
        assert_eq!(other.friendly_message(), "no such route");
    }

    #[test]
    fn transport_error_has_fixed_message_and_no_status() {
        let err = ApiError::transport();
        assert_eq!(err.message, TRANSPORT_ERROR_MESSAGE);
        assert_eq!(err.status, None);
        assert_eq!(err.friendly_message(), TRANSPORT_ERROR_MESSAGE);
    }
}
