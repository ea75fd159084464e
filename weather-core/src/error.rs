//! Error taxonomy of the API access layer.
//!
//! Transport failures are turned into a [`ClassifiedError`] by [`classify`].
//! Callers branch on [`ClassifiedError::kind`]; the message is advisory.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::RequestCategory;

const GENERIC_MESSAGE: &str = "An unexpected error occurred while contacting the weather service";

/// Closed set of outcomes a caller has to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidApiKey,
    RateLimitExceeded,
    LocationNotFound,
    NetworkError,
    ServerError,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidApiKey => "INVALID_API_KEY",
            ErrorKind::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorKind::LocationNotFound => "LOCATION_NOT_FOUND",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Whether the dispatcher moves on to the next credential.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::InvalidApiKey | ErrorKind::RateLimitExceeded)
    }

    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::InvalidApiKey => "API Key Error",
            ErrorKind::RateLimitExceeded => "Rate Limit Exceeded",
            ErrorKind::LocationNotFound => "Location Not Found",
            ErrorKind::NetworkError => "Network Error",
            ErrorKind::ServerError => "Server Error",
            ErrorKind::UnknownError => "Error",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ErrorKind::InvalidApiKey => "🔑",
            ErrorKind::RateLimitExceeded => "⏱️",
            ErrorKind::LocationNotFound => "🗺️",
            ErrorKind::NetworkError => "📶",
            ErrorKind::ServerError => "🖥️",
            ErrorKind::UnknownError => "❓",
        }
    }

    pub fn suggested_action(&self) -> &'static str {
        match self {
            ErrorKind::InvalidApiKey => {
                "Please check your API keys (run `weather configure` or set TOMORROW_API_KEY) and try again."
            }
            ErrorKind::RateLimitExceeded => "Please wait a moment before trying again.",
            ErrorKind::LocationNotFound => "Please check the city name and try again.",
            ErrorKind::NetworkError => "Please check your internet connection and try again.",
            ErrorKind::ServerError => {
                "The weather service is currently unavailable. Please try again later."
            }
            ErrorKind::UnknownError => "Please try again or contact support if the issue persists.",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw failure reported by a [`Transport`](crate::provider::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never produced a response (connect failure, timeout, ...).
    #[error("no response from server: {message}")]
    NoResponse { message: String },

    /// The server answered with a non-success status.
    #[error("server responded with HTTP {status}")]
    Status { status: u16, message: Option<String> },

    /// The server answered with a success status but the body is unusable.
    #[error("invalid response body: {message}")]
    InvalidBody { message: String },
}

/// A failure labelled with an [`ErrorKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<TransportError>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), source: None }
    }

    pub fn with_source(kind: ErrorKind, message: impl Into<String>, source: TransportError) -> Self {
        Self { kind, message: message.into(), source: Some(source) }
    }

    /// Every credential of the category's chain has been tried.
    pub fn exhausted(category: RequestCategory, attempts: usize) -> Self {
        Self::new(
            ErrorKind::RateLimitExceeded,
            format!(
                "All API keys exhausted for {category} requests after {attempts} attempt(s); rate limit exceeded on every key"
            ),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&TransportError> {
        self.source.as_ref()
    }
}

/// Label a transport failure. Pure: the same inputs always give the same result.
pub fn classify(error: &TransportError, category: RequestCategory) -> ClassifiedError {
    let (kind, message) = match error {
        TransportError::NoResponse { message } => (
            ErrorKind::NetworkError,
            format!("Unable to reach the weather service: {message}"),
        ),
        TransportError::Status { status: status @ (401 | 403), .. } => (
            ErrorKind::InvalidApiKey,
            format!("Invalid API key or unauthorized access for {category} requests (HTTP {status})"),
        ),
        TransportError::Status { status: 404, .. } => (
            ErrorKind::LocationNotFound,
            "Location not found. Please check the city name.".to_string(),
        ),
        TransportError::Status { status: 429, .. } => (
            ErrorKind::RateLimitExceeded,
            format!("API rate limit exceeded for {category} requests"),
        ),
        TransportError::Status { status: status @ (500 | 502 | 503 | 504), .. } => (
            ErrorKind::ServerError,
            format!("The weather service is experiencing issues (HTTP {status})"),
        ),
        TransportError::Status { message, .. } => (
            ErrorKind::UnknownError,
            message.clone().unwrap_or_else(|| GENERIC_MESSAGE.to_string()),
        ),
        TransportError::InvalidBody { .. } => (ErrorKind::UnknownError, GENERIC_MESSAGE.to_string()),
    };

    ClassifiedError::with_source(kind, message, error.clone())
}
