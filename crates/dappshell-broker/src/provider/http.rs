//! JSON-RPC 2.0 over HTTP.
//!
//! HTTP has no server push, so the pub/sub calls are refused.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use super::{Provider, ProviderError};

/// Configuration for the HTTP provider.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Node endpoint (e.g., "<http://127.0.0.1:8545>").
    pub url: String,
}

/// JSON-RPC client posting one request per call.
#[derive(Debug)]
pub struct HttpProvider {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(config: &HttpProviderConfig) -> Result<Self, ProviderError> {
        if config.url.is_empty() {
            return Err(ProviderError::Config("url is empty".into()));
        }

        // reqwest uses rustls-no-provider; Err only means one is installed already.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn request_body(&self, method: &str, params: &[Value]) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        })
    }
}

/// Extract `result` or `error` from a JSON-RPC response body.
pub(crate) fn parse_response(body: Value) -> Result<Value, ProviderError> {
    let Value::Object(mut obj) = body else {
        return Err(ProviderError::InvalidResponse("response is not an object".into()));
    };

    if let Some(error) = obj.remove("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), String::from);
        return Err(ProviderError::Rpc { code, message });
    }

    obj.remove("result")
        .ok_or_else(|| ProviderError::InvalidResponse("missing result".into()))
}

#[async_trait]
impl Provider for HttpProvider {
    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError> {
        let body = self.request_body(method, &params);
        debug!(method, url = %self.url, "Forwarding call to provider");

        let resp = self.http.post(&self.url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::InvalidResponse(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }
        parse_response(resp.json().await?)
    }

    async fn subscribe(&self, _api: &Value, _params: Vec<Value>) -> Result<Value, ProviderError> {
        Err(ProviderError::Unsupported("subscribe"))
    }

    async fn unsubscribe(&self, _sub_id: &str) -> Result<Value, ProviderError> {
        Err(ProviderError::Unsupported("unsubscribe"))
    }

    async fn unsubscribe_all(&self) -> Result<Value, ProviderError> {
        Err(ProviderError::Unsupported("unsubscribe"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn provider() -> HttpProvider {
        HttpProvider::new(&HttpProviderConfig {
            url: "http://127.0.0.1:8545".into(),
        })
        .unwrap()
    }

    #[test]
    fn empty_url_returns_config_error() {
        let err = HttpProvider::new(&HttpProviderConfig { url: String::new() }).unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn request_ids_increase() {
        let provider = provider();
        let first = provider.request_body("eth_blockNumber", &[]);
        let second = provider.request_body("eth_getBalance", &[json!("0x0"), json!("latest")]);

        assert_eq!(first["jsonrpc"], "2.0");
        assert_eq!(first["method"], "eth_blockNumber");
        assert_eq!(first["params"], json!([]));
        assert_eq!(second["params"], json!(["0x0", "latest"]));
        assert!(second["id"].as_u64() > first["id"].as_u64());
    }

    #[test]
    fn result_is_extracted() {
        let result = parse_response(json!({"jsonrpc": "2.0", "id": 1, "result": "0x10"})).unwrap();
        assert_eq!(result, json!("0x10"));
    }

    #[test]
    fn null_result_is_a_success() {
        let result = parse_response(json!({"jsonrpc": "2.0", "id": 1, "result": null})).unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn rpc_error_keeps_message() {
        let err = parse_response(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"},
        }))
        .unwrap_err();

        assert!(matches!(err, ProviderError::Rpc { code: -32601, .. }));
        assert_eq!(err.to_string(), "Method not found");
    }

    #[test]
    fn missing_result_is_invalid() {
        let err = parse_response(json!({"jsonrpc": "2.0", "id": 1})).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn pubsub_is_unsupported() {
        let provider = provider();
        let err = provider.subscribe(&json!({}), vec![]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported("subscribe")));
        assert!(provider.unsubscribe_all().await.is_err());
    }
}
