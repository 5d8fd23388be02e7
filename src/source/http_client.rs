use crate::config::ProviderConfig;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::SourceError;

pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Yahoo hands out a consent cookie on first contact
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { inner })
    }

    /// Fetch a URL as text. One attempt only; failures propagate to the
    /// caller, which decides how to surface them.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        debug!("GET {}", url);

        let resp = self
            .inner
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = resp.status();
        let body = resp.text().await.context("Failed to read response body")?;

        accept_body(status, body).map_err(Into::into)
    }
}

/// Decide whether a response body goes on to the parser. Yahoo reports
/// unknown symbols as 404 with a JSON error body, so any JSON object is
/// passed through and the parser turns it into a readable message.
pub fn accept_body(status: StatusCode, body: String) -> Result<String, SourceError> {
    if status.is_success() || body.trim_start().starts_with('{') {
        Ok(body)
    } else {
        Err(SourceError::Http(status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_is_passed_through() {
        let body = accept_body(StatusCode::OK, "{\"chart\":{}}".into()).unwrap();
        assert_eq!(body, "{\"chart\":{}}");
    }

    #[test]
    fn json_error_body_reaches_the_parser() {
        let body = r#"  {"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let out = accept_body(StatusCode::NOT_FOUND, body.into()).unwrap();
        assert!(out.contains("Not Found"));
    }

    #[test]
    fn non_json_error_becomes_http_error() {
        let err = accept_body(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests".into()).unwrap_err();
        assert!(matches!(err, SourceError::Http(429)));
        assert_eq!(err.to_string(), "HTTP error 429");

        let err = accept_body(StatusCode::BAD_GATEWAY, String::new()).unwrap_err();
        assert!(matches!(err, SourceError::Http(502)));
    }
}
