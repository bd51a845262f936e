use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tradelink_core::*;

/// An in-memory transport for tests and dry runs.
///
/// Replays queued responses in order and records every request it is handed,
/// so callers can assert on exactly what would have gone over the wire.
#[derive(Default)]
pub struct ScriptedTransport {
    state: Mutex<ScriptState>,
}

#[derive(Default)]
struct ScriptState {
    responses: VecDeque<Result<serde_json::Value, TransportError>>,
    /// Served once the queue is empty.
    fallback: Option<serde_json::Value>,
    requests: Vec<SignedRequest>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that answers every request with the same body.
    pub fn always(response: serde_json::Value) -> Self {
        let transport = Self::new();
        transport.lock().fallback = Some(response);
        transport
    }

    /// Queue a successful response.
    pub fn push_response(&self, response: serde_json::Value) -> &Self {
        self.lock().responses.push_back(Ok(response));
        self
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) -> &Self {
        self.lock().responses.push_back(Err(error));
        self
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<SignedRequest> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn last_request(&self) -> Option<SignedRequest> {
        self.lock().requests.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: SignedRequest) -> Result<serde_json::Value, TransportError> {
        let mut state = self.lock();
        let url = request.url.clone();
        state.requests.push(request);

        match state.responses.pop_front() {
            Some(response) => response,
            None => state
                .fallback
                .clone()
                .ok_or_else(|| TransportError::Network(format!("No scripted response for {}", url))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn request(url: &str) -> SignedRequest {
        SignedRequest {
            url: url.to_string(),
            method: HttpMethod::Get,
            body: None,
            headers: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let transport = ScriptedTransport::new();
        transport
            .push_response(serde_json::json!({"n": 1}))
            .push_error(TransportError::Timeout("slow".to_string()));

        let first = transport.execute(request("https://a/1")).await.unwrap();
        assert_eq!(first["n"], 1);
        let second = transport.execute(request("https://a/2")).await;
        assert!(matches!(second, Err(TransportError::Timeout(_))));
        let third = transport.execute(request("https://a/3")).await;
        assert!(matches!(third, Err(TransportError::Network(_))));

        assert_eq!(transport.request_count(), 3);
        assert_eq!(transport.last_request().unwrap().url, "https://a/3");
    }

    #[tokio::test]
    async fn test_fallback_serves_every_request() {
        let transport = ScriptedTransport::always(serde_json::json!({"ok": true}));
        for _ in 0..3 {
            let body = transport.execute(request("https://a")).await.unwrap();
            assert_eq!(body["ok"], true);
        }
    }
}
