//! Thin authenticated client for the Steel REST API

use crate::error::ApiError;
use crate::session::{ConfigStore, Instance, Settings};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const CLOUD_API_URL: &str = "https://api.steel.dev/v1";
pub const LOCAL_API_URL: &str = "http://localhost:3000/v1";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "STEEL_API_URL";

const API_KEY_HEADER: &str = "Steel-Api-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Base URL for the configured instance. Cloud unless settings say otherwise.
pub fn base_url(settings: Option<&Settings>) -> String {
    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.is_empty() {
            return url;
        }
    }
    match settings.map(|s| s.instance).unwrap_or_default() {
        Instance::Cloud => CLOUD_API_URL.to_string(),
        Instance::Local => LOCAL_API_URL.to_string(),
    }
}

pub struct ApiClient {
    base: String,
    api_key: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: &str, api_key: impl Into<String>) -> Result<Self, ApiError> {
        Url::parse(base).map_err(|_| ApiError::InvalidUrl(base.to_string()))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("steel-cli/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    /// Client for the stored credential and instance settings
    pub fn from_store(store: &ConfigStore) -> Result<Self, ApiError> {
        let credential = store.get_api_key().ok_or(ApiError::NotAuthenticated)?;
        Self::new(&base_url(store.get_settings().as_ref()), credential.api_key)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Absolute URL of an endpoint path such as `sessions/abc`
    pub fn endpoint_url(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|_| ApiError::InvalidUrl(raw))
    }

    /// Send a request, turning transport failures and non-2xx statuses into errors
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(Url, reqwest::Response), ApiError> {
        let url = self.endpoint_url(path)?;
        log::debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(&text, status.canonical_reason()),
            });
        }
        Ok((url, response))
    }

    /// Send a request and decode the JSON response.
    ///
    /// An empty response body decodes to `null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let (url, response) = self.send(method, path, body).await?;
        let text = response.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Send a request and return the raw response body
    pub async fn request_bytes(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Vec<u8>, ApiError> {
        let (url, response) = self.send(method, path, body).await?;
        let bytes = response.bytes().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }
}

/// Human-readable message for an error response: the JSON `message` field
/// when present, otherwise the raw body, otherwise the status reason
pub fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(message)) = obj.get("message") {
            return message.clone();
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    reason.unwrap_or("Unknown error").to_string()
}

/// Turn a response into display entries.
///
/// With a `result_object` key the value under that key is used; arrays are
/// flattened into their elements.
pub fn unwrap_result(response: Value, result_object: Option<&str>) -> Vec<Value> {
    let value = match (result_object, response) {
        (Some(key), Value::Object(mut obj)) => obj.remove(key).unwrap_or(Value::Null),
        (_, other) => other,
    };
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/v1", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (base, handle)
    }

    #[tokio::test]
    async fn test_request_sends_api_key() {
        let (base, server) =
            serve_once("200 OK", r#"{"sessions":[{"id":"a"},{"id":"b"}]}"#).await;
        let client = ApiClient::new(&base, "sk-test").unwrap();

        let value = client.request(Method::GET, "sessions", None).await.unwrap();
        let raw_request = server.await.unwrap().to_lowercase();

        assert!(raw_request.starts_with("get /v1/sessions "));
        assert!(raw_request.contains("steel-api-key: sk-test"));
        assert_eq!(unwrap_result(value, Some("sessions")).len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_uses_server_message() {
        let (base, _server) =
            serve_once("404 Not Found", r#"{"message":"Session not found"}"#).await;
        let client = ApiClient::new(&base, "sk-test").unwrap();

        let err = client
            .request(Method::GET, "sessions/nope", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Http { status: 404, ref message } if message == "Session not found"
        ));
    }

    #[tokio::test]
    async fn test_request_bytes_returns_raw_body() {
        let (base, server) = serve_once("200 OK", "%PDF-1.4 raw").await;
        let client = ApiClient::new(&base, "sk-test").unwrap();

        let bytes = client
            .request_bytes(Method::GET, "sessions/s1/files/f1/download", None)
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.4 raw");
        let raw_request = server.await.unwrap().to_lowercase();
        assert!(raw_request.starts_with("get /v1/sessions/s1/files/f1/download "));
    }

    #[test]
    fn test_from_store_requires_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        assert!(matches!(
            ApiClient::from_store(&store),
            Err(ApiError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_endpoint_url() {
        let client = ApiClient::new("https://api.steel.dev/v1/", "k").unwrap();
        assert_eq!(
            client.endpoint_url("/sessions/abc/release").unwrap().as_str(),
            "https://api.steel.dev/v1/sessions/abc/release"
        );
        assert!(matches!(
            ApiClient::new("not a url", "k"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(r#"{"message":"bad"}"#, Some("Bad Request")), "bad");
        assert_eq!(error_message("upstream down", None), "upstream down");
        assert_eq!(error_message("", Some("Bad Gateway")), "Bad Gateway");
    }

    #[test]
    fn test_unwrap_result() {
        let response = json!({"sessions": [{"id": 1}], "total": 1});
        assert_eq!(unwrap_result(response, Some("sessions")), vec![json!({"id": 1})]);
        assert_eq!(
            unwrap_result(json!({"id": 2}), None),
            vec![json!({"id": 2})]
        );
        assert!(unwrap_result(json!({"other": 1}), Some("sessions")).is_empty());
    }
}
