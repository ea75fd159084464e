use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::TransportError;

use super::Transport;

/// HTTP transport for the Tomorrow.io v4 REST API.
#[derive(Debug, Clone)]
pub struct TomorrowTransport {
    base_url: String,
    http: Client,
}

impl TomorrowTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!("weather-cli/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { base_url: base_url.into(), http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint.trim_start_matches('/'))
    }
}

/// Error body returned by the API on non-success statuses.
#[derive(Debug, Deserialize)]
struct TmErrorBody {
    message: Option<String>,
}

#[async_trait]
impl Transport for TomorrowTransport {
    async fn get(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value, TransportError> {
        let url = self.url(endpoint);

        let res = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(params)
            .send()
            .await
            .map_err(|e| TransportError::NoResponse { message: e.without_url().to_string() })?;

        let status = res.status();
        let body = res.text().await;

        if !status.is_success() {
            let message = body.ok().and_then(|b| error_message(&b));
            return Err(TransportError::Status { status: status.as_u16(), message });
        }

        let body = body.map_err(|e| TransportError::InvalidBody { message: e.without_url().to_string() })?;

        serde_json::from_str(&body).map_err(|e| TransportError::InvalidBody {
            message: format!("{e}: {}", truncate_body(&body)),
        })
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<TmErrorBody>(body).ok().and_then(|b| b.message)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_endpoint() {
        let transport = TomorrowTransport::new("https://api.tomorrow.io/v4/", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.url("/weather/realtime"), "https://api.tomorrow.io/v4/weather/realtime");
        assert_eq!(transport.url("weather/forecast"), "https://api.tomorrow.io/v4/weather/forecast");
    }

    #[test]
    fn error_message_is_read_from_json_body() {
        let body = r#"{"code":429001,"type":"Too Many Calls","message":"The request limit for this resource has been reached"}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("The request limit for this resource has been reached")
        );
        assert_eq!(error_message("<html>oops</html>"), None);
        assert_eq!(error_message(r#"{"code":1}"#), None);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[tokio::test]
    async fn unreachable_host_is_reported_without_response() {
        let transport = TomorrowTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = transport.get("weather/realtime", &[]).await.unwrap_err();
        assert!(matches!(err, TransportError::NoResponse { .. }));
    }
}
