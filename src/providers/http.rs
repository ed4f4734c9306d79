//! HTTP transport
//!
//! Information Hiding:
//! - reqwest client and base URL hidden
//! - Status handling and body decoding internalized
//! - Every failure maps onto `ProviderError`, never a panic

use super::{Transport, TransportKind};
use crate::core::protocol::{check_application_error, HttpCall, HTTP_CALL_PATH};
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::{timeout, Duration};

pub struct HttpTransport {
    name: String,
    client: Client,
    base_url: String,
    timeout: Duration,
    closed: AtomicBool,
}

impl HttpTransport {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            name: name.into(),
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            closed: AtomicBool::new(false),
        }
    }

    fn call_url(&self) -> String {
        format!("{}{}", self.base_url, HTTP_CALL_PATH)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn call(&self, method: &str, params: Value) -> ProviderResult<Value> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ProviderError::Closed);
        }

        let body = HttpCall {
            method: method.to_string(),
            params,
        };

        tracing::debug!("[Provider {}] POST {} method={}", self.name, self.call_url(), method);

        let request_future = async {
            let response = self
                .client
                .post(self.call_url())
                .json(&body)
                .send()
                .await
                .map_err(|e| ProviderError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(ProviderError::Transport(format!("HTTP error {}: {}", status, text)));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| ProviderError::Protocol(format!("undecodable body: {}", e)))
        };

        match timeout(self.timeout, request_future).await {
            Ok(Ok(result)) => check_application_error(result),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProviderError::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
