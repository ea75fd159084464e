use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::error::TransportError;

pub mod tomorrow;

pub use tomorrow::TomorrowTransport;

/// One round trip to the upstream weather API.
///
/// `params` already carries the credential; implementations only move bytes
/// and report what went wrong without interpreting it.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value, TransportError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::{
        collections::VecDeque,
        sync::{Mutex, PoisonError},
    };
    use tokio::time::Instant;

    #[derive(Debug, Clone)]
    pub(crate) struct RecordedCall {
        pub endpoint: String,
        pub params: Vec<(String, String)>,
        pub at: Instant,
    }

    impl RecordedCall {
        pub fn param(&self, name: &str) -> Option<&str> {
            self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
        }

        pub fn api_key(&self) -> &str {
            self.param("apikey").unwrap_or_default()
        }
    }

    /// Replays queued responses in order and records every call.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<Value, TransportError>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedTransport {
        pub fn new(responses: impl IntoIterator<Item = Result<Value, TransportError>>) -> Self {
            Self { responses: Mutex::new(responses.into_iter().collect()), calls: Mutex::default() }
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value, TransportError> {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(RecordedCall {
                endpoint: endpoint.to_string(),
                params: params.to_vec(),
                at: Instant::now(),
            });

            self.responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::NoResponse { message: "script exhausted".into() }))
        }
    }

    pub(crate) fn status(status: u16) -> Result<Value, TransportError> {
        Err(TransportError::Status { status, message: None })
    }
}
