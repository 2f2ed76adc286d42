//! Minimal JSON-over-HTTP client with safe logging and bearer auth.
//!
//! - Base URL anchoring, per-client timeout
//! - `Authorization: Bearer` values are sent verbatim and never logged
//! - Non-2xx responses become [`HttpError::Api`] with the provider's message
//! - Optional *raw* request/response logging via `QUARRY_HTTP_RAW=1`
//!
//! Requests are sent exactly once. Callers that want retries wrap the call
//! themselves.
//!
//! ```no_run
//! # async fn demo() -> Result<(), quarry_http::HttpError> {
//! let client = quarry_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .post_json("search", Some("secret"), &serde_json::json!({"query": "rust"}))
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

const RAW_ENV: &str = "QUARRY_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status for [`HttpError::Api`], `None` for transport-level failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// A trailing slash is added to the base so that relative paths are joined
    /// underneath it rather than replacing its last segment.
    ///
    /// ```no_run
    /// use quarry_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com/v1")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(60));
    /// assert_eq!(client.base_url().as_str(), "https://api.example.com/v1/");
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&normalized).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(60),
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// POST a JSON body, optionally with bearer auth, and decode a JSON reply.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(Method::POST, path, bearer, Some(body))
            .await
    }

    async fn request_json<B, T>(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<&B>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(self.default_timeout);

        let body_bytes = match body {
            Some(b) => {
                let bytes = serde_json::to_vec(b).map_err(|e| HttpError::Build(e.to_string()))?;
                rb = rb.header(CONTENT_TYPE, "application/json").body(bytes.clone());
                Some(bytes)
            }
            None => None,
        };

        if let Some(tok) = bearer {
            check_bearer(tok)?;
            rb = rb.bearer_auth(tok);
        }

        let req_id = format!(
            "r{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );

        let auth_kind = if bearer.is_some() { "bearer" } else { "none" };
        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            timeout_ms=self.default_timeout.as_millis() as u64,
            auth_kind,
            has_body=%body_bytes.is_some(),
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(&method, &url, bearer.is_some(), body_bytes.as_deref());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let t0 = Instant::now();
        let resp = rb.send().await.map_err(|err| {
            tracing::warn!(req_id=%req_id, error=%err, "http.network_error.send");
            HttpError::Network(err.to_string())
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            tracing::warn!(req_id=%req_id, error=%err, "http.network_error.body");
            HttpError::Network(err.to_string())
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let request_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            x_request_id=%request_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let mut body_snip = bytes.to_vec();
            let truncated = body_snip.len() > RAW_MAX_BODY;
            if truncated {
                body_snip.truncate(RAW_MAX_BODY);
            }
            tracing::debug!(
                target: "http.raw",
                %req_id,
                %status,
                duration_ms=dur_ms,
                headers=?redact_headers(&headers),
                body=%String::from_utf8_lossy(&body_snip),
                truncated,
                "response"
            );
        }

        let snippet = snip_body(&bytes);

        if status.is_success() {
            return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(
                    req_id=%req_id,
                    serde_line=%e.line(),
                    serde_col=%e.column(),
                    serde_err=%e,
                    body_snippet=%snippet,
                    "http.response.decode_error"
                );
                HttpError::Decode(e.to_string(), snippet)
            });
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id=%req_id,
            %status,
            message=%message,
            x_request_id=%request_id,
            body_snippet=%snippet,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id,
        })
    }
}

/// Best-effort curl line for repro; the bearer token is never included.
fn make_curl(method: &Method, url: &Url, has_bearer: bool, body: Option<&[u8]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{method}")];
    if has_bearer {
        parts.push("-H 'Authorization: Bearer <redacted>'".to_string());
    }
    if let Some(bytes) = body {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                let mut s = s.to_string();
                truncate_on_char_boundary(&mut s, RAW_MAX_BODY);
                parts.push("-H 'Content-Type: application/json'".to_string());
                parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
            }
            Err(_) => parts.push(format!("--data-binary @- # ({} bytes)", bytes.len())),
        }
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if key.eq_ignore_ascii_case("authorization") {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

/// Pull a human-readable message out of a provider error body.
fn extract_error_message(body: &[u8]) -> String {
    // {"detail":{"error":"..."}}
    #[derive(Deserialize)]
    struct NestedDetail {
        detail: DetailError,
    }
    #[derive(Deserialize)]
    struct DetailError {
        error: String,
    }

    // {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct NestedError {
        error: ErrorMessage,
    }
    #[derive(Deserialize)]
    struct ErrorMessage {
        message: String,
    }

    // {"message":"..."} | {"detail":"..."} | {"error":"..."}
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(d) = serde_json::from_slice::<NestedDetail>(body) {
        return d.detail.error;
    }
    if let Ok(e) = serde_json::from_slice::<NestedError>(body) {
        return e.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Flat>(body) {
        for candidate in [m.message, m.detail, m.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    truncate_on_char_boundary(&mut snip, SNIPPET_MAX);
    snip
}

/// Cut `s` to at most `max` bytes plus a `...` marker, never inside a char.
fn truncate_on_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
    s.push_str("...");
}

/// The token is sent as-is; only reject values that cannot be a header.
fn check_bearer(token: &str) -> Result<(), HttpError> {
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map(|_| ())
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_check_accepts_quotes_and_inner_spaces() {
        assert!(check_bearer("\"tvly ab c\"").is_ok());
    }

    #[test]
    fn bearer_check_rejects_values_that_cannot_be_headers() {
        assert!(matches!(check_bearer("tvly-a\nb"), Err(HttpError::Build(_))));
        assert!(matches!(check_bearer("tvly-\u{7f}"), Err(HttpError::Build(_))));
    }

    #[test]
    fn error_message_prefers_nested_detail() {
        let body = br#"{"detail":{"error":"Unauthorized: missing or invalid API key."}}"#;
        assert_eq!(
            extract_error_message(body),
            "Unauthorized: missing or invalid API key."
        );
    }

    #[test]
    fn error_message_falls_back_to_flat_fields_then_snippet() {
        assert_eq!(extract_error_message(br#"{"detail":"quota"}"#), "quota");
        assert_eq!(extract_error_message(br#"{"error":{"message":"boom"}}"#), "boom");
        assert_eq!(extract_error_message(b"<html>bad gateway</html>"), "<html>bad gateway</html>");
    }

    #[test]
    fn snippet_is_truncated_on_char_boundary() {
        let body = "é".repeat(400);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_MAX + 3);
    }

    #[test]
    fn long_curl_body_is_cut_on_char_boundary() {
        let url = Url::parse("https://api.example.com/search").unwrap();
        let body = format!(r#"{{"query":"a{}"}}"#, "é".repeat(RAW_MAX_BODY));
        let curl = make_curl(&Method::POST, &url, false, Some(body.as_bytes()));
        assert!(curl.contains("..."));
        assert!(curl.len() < body.len());
    }

    #[test]
    fn curl_never_contains_the_token() {
        let url = Url::parse("https://api.example.com/search").unwrap();
        let curl = make_curl(&Method::POST, &url, true, Some(br#"{"query":"it's"}"#));
        assert!(curl.contains("Bearer <redacted>"));
        assert!(curl.contains(r"it'\''s"));
    }

    #[test]
    fn base_gets_trailing_slash() {
        let client = HttpClient::new("https://api.example.com/v1").unwrap();
        let joined = client.base_url().join("search").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.com/v1/search");
    }
}
