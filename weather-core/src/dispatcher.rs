//! Issues one logical request against the upstream API, walking the
//! category's fallback chain while failures are key-related.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    category::RequestCategory,
    error::{ClassifiedError, classify},
    health::KeyHealthTracker,
    keys::KeyRegistry,
    provider::Transport,
    throttle::RequestThrottle,
    usage::UsageCounter,
};

/// Mutable request state shared by every dispatch of one dispatcher.
#[derive(Debug, Default)]
pub struct DispatchContext {
    pub throttle: RequestThrottle,
    pub health: KeyHealthTracker,
    pub usage: UsageCounter,
}

#[derive(Debug, Clone)]
pub struct RequestDispatcher {
    transport: Arc<dyn Transport>,
    registry: KeyRegistry,
    context: Arc<DispatchContext>,
}

impl RequestDispatcher {
    pub fn new(transport: Arc<dyn Transport>, registry: KeyRegistry) -> Self {
        Self::with_context(transport, registry, Arc::new(DispatchContext::default()))
    }

    pub fn with_context(
        transport: Arc<dyn Transport>,
        registry: KeyRegistry,
        context: Arc<DispatchContext>,
    ) -> Self {
        Self { transport, registry, context }
    }

    pub fn context(&self) -> &Arc<DispatchContext> {
        &self.context
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// Fetch `endpoint` for `category`.
    ///
    /// Each attempt waits for the category's throttle and uses the next
    /// credential of its chain. Invalid-key and rate-limit failures move on to
    /// the next credential; any other failure is returned at once. Running
    /// out of credentials yields a `RateLimitExceeded` error.
    pub async fn dispatch(
        &self,
        category: RequestCategory,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ClassifiedError> {
        let chain = self.registry.chain(category);

        for attempt in 0..chain.len() {
            self.context.throttle.await_turn(category).await;

            let credential = chain.get(attempt);
            let mut query: Vec<(String, String)> =
                params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
            query.push(("apikey".to_string(), credential.expose().to_string()));

            debug!(%category, endpoint, attempt, key = %credential.redacted(), "sending request");

            match self.transport.get(endpoint, &query).await {
                Ok(payload) => {
                    self.context.health.mark_healthy(category, attempt);
                    self.context.usage.record(category);
                    info!(%category, endpoint, attempt, "request succeeded");
                    return Ok(payload);
                }
                Err(err) => {
                    let classified = classify(&err, category);
                    self.context.health.record_failure(category, attempt, &classified);

                    if !classified.kind().is_retryable() {
                        warn!(%category, endpoint, kind = %classified.kind(), "request failed: {classified}");
                        return Err(classified);
                    }

                    warn!(
                        %category,
                        endpoint,
                        attempt,
                        key = %credential.redacted(),
                        kind = %classified.kind(),
                        "key rejected, trying next key in chain"
                    );
                }
            }
        }

        warn!(%category, endpoint, keys = chain.len(), "all keys exhausted");
        Err(ClassifiedError::exhausted(category, chain.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{ErrorKind, TransportError},
        health::Validity,
        keys::Credential,
        provider::testing::{ScriptedTransport, status},
        throttle::MIN_INTERVAL,
    };
    use serde_json::json;

    fn dispatcher(transport: &Arc<ScriptedTransport>, keys: &[&str]) -> RequestDispatcher {
        let keys: Vec<_> = keys.iter().map(|k| Credential::new(*k)).collect();
        let registry = KeyRegistry::rotated(&keys).unwrap();
        RequestDispatcher::new(transport.clone(), registry)
    }

    fn location() -> Vec<(&'static str, String)> {
        vec![("location", "Paris".to_string())]
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_key() {
        let transport = Arc::new(ScriptedTransport::new([Ok(json!({"ok": true}))]));
        let dispatcher = dispatcher(&transport, &["k1", "k2"]);

        let payload = dispatcher
            .dispatch(RequestCategory::Current, "weather/realtime", &location())
            .await
            .unwrap();

        assert_eq!(payload, json!({"ok": true}));
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].endpoint, "weather/realtime");
        assert_eq!(calls[0].param("location"), Some("Paris"));
        assert_eq!(calls[0].api_key(), "k1");
        assert_eq!(dispatcher.context().usage.snapshot().current, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_keys_fall_back_in_order() {
        let transport = Arc::new(ScriptedTransport::new([
            status(429),
            status(429),
            Ok(json!({"attempt": 2})),
        ]));
        let dispatcher = dispatcher(&transport, &["k1", "k2", "k3"]);

        let payload = dispatcher
            .dispatch(RequestCategory::Current, "weather/realtime", &location())
            .await
            .unwrap();

        assert_eq!(payload, json!({"attempt": 2}));

        let keys: Vec<_> = transport.calls().iter().map(|c| c.api_key().to_string()).collect();
        assert_eq!(keys, ["k1", "k2", "k3"]);

        let usage = dispatcher.context().usage.snapshot();
        assert_eq!(usage.current, 1);
        assert_eq!(usage.total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_respect_throttle_spacing() {
        let transport = Arc::new(ScriptedTransport::new([status(429), status(401), Ok(json!({}))]));
        let dispatcher = dispatcher(&transport, &["k1", "k2", "k3"]);

        dispatcher.dispatch(RequestCategory::Forecast, "weather/forecast", &location()).await.unwrap();

        let calls = transport.calls();
        for pair in calls.windows(2) {
            assert!(pair[1].at - pair[0].at >= MIN_INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn category_chain_starts_from_its_own_primary() {
        let transport = Arc::new(ScriptedTransport::new([status(429), Ok(json!({}))]));
        let dispatcher = dispatcher(&transport, &["k1", "k2", "k3"]);

        dispatcher.dispatch(RequestCategory::Forecast, "weather/forecast", &location()).await.unwrap();

        let keys: Vec<_> = transport.calls().iter().map(|c| c.api_key().to_string()).collect();
        assert_eq!(keys, ["k2", "k3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_key_everywhere_ends_in_exhaustion() {
        let transport = Arc::new(ScriptedTransport::new([status(401), status(403), status(401)]));
        let dispatcher = dispatcher(&transport, &["k1", "k2", "k3"]);

        let err = dispatcher
            .dispatch(RequestCategory::Historical, "weather/history/recent", &location())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert!(err.message().contains("All API keys exhausted"));
        assert_eq!(transport.calls().len(), 3);

        let keys: Vec<_> = transport.calls().iter().map(|c| c.api_key().to_string()).collect();
        assert_eq!(keys, ["k3", "k1", "k2"]);

        let health = dispatcher.context().health.record(RequestCategory::Historical);
        assert_eq!(health.is_valid, Validity::Invalid);
        assert_eq!(health.consecutive_failures, 3);
        assert_eq!(dispatcher.context().usage.snapshot().total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn location_not_found_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new([status(404), Ok(json!({}))]));
        let dispatcher = dispatcher(&transport, &["k1", "k2"]);

        let params = vec![("location", "Nowhere123".to_string())];
        let err = dispatcher
            .dispatch(RequestCategory::Current, "weather/realtime", &params)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::LocationNotFound);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn network_and_server_errors_surface_immediately() {
        let transport = Arc::new(ScriptedTransport::new([
            Err(TransportError::NoResponse { message: "timed out".into() }),
            status(503),
        ]));
        let dispatcher = dispatcher(&transport, &["k1", "k2"]);

        let first = dispatcher.dispatch(RequestCategory::Current, "weather/realtime", &location()).await;
        assert_eq!(first.unwrap_err().kind(), ErrorKind::NetworkError);

        let second = dispatcher.dispatch(RequestCategory::Current, "weather/realtime", &location()).await;
        assert_eq!(second.unwrap_err().kind(), ErrorKind::ServerError);

        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_key_health() {
        let transport = Arc::new(ScriptedTransport::new([status(401), status(429), Ok(json!({}))]));
        let dispatcher = dispatcher(&transport, &["k1", "k2", "k3"]);

        dispatcher.dispatch(RequestCategory::Current, "weather/realtime", &location()).await.unwrap();

        let health = dispatcher.context().health.record(RequestCategory::Current);
        assert_eq!(health.is_valid, Validity::Valid);
        assert_eq!(health.consecutive_failures, 0);
        assert_eq!(health.last_credential, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn single_key_chain_exhausts_after_one_attempt() {
        let transport = Arc::new(ScriptedTransport::new([status(429)]));
        let dispatcher = dispatcher(&transport, &["solo"]);

        let err = dispatcher
            .dispatch(RequestCategory::Forecast, "weather/forecast", &location())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert!(err.message().contains("All API keys exhausted"));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shared_context_is_visible_to_caller() {
        let transport = Arc::new(ScriptedTransport::new([Ok(json!({})), Ok(json!({}))]));
        let keys = vec![Credential::new("k1")];
        let context = Arc::new(DispatchContext::default());
        let dispatcher = RequestDispatcher::with_context(
            transport.clone(),
            KeyRegistry::rotated(&keys).unwrap(),
            Arc::clone(&context),
        );

        dispatcher.dispatch(RequestCategory::Current, "weather/realtime", &location()).await.unwrap();
        dispatcher.dispatch(RequestCategory::Forecast, "weather/forecast", &location()).await.unwrap();

        let usage = context.usage.snapshot();
        assert_eq!((usage.current, usage.forecast, usage.total), (1, 1, 2));
    }
}
