//! Subprocess transport
//!
//! Line-delimited JSON-RPC over the stdin/stdout of a long-lived provider
//! process. The process itself is owned by a dedicated actor task; this type
//! is only the mailbox handle.

use super::{Transport, TransportKind};
use crate::actors::messages::{ProcessMessage, ProviderCall};
use crate::actors::process_actor::ProcessActorHandle;
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Duration;

pub struct ProcessTransport {
    name: String,
    handle: ProcessActorHandle,
    timeout: Duration,
}

impl ProcessTransport {
    pub fn new(config: ProviderConfig, timeout: Duration, buffer_size: usize) -> Self {
        let name = config.name.clone();
        Self {
            name,
            handle: ProcessActorHandle::new(config, buffer_size),
            timeout,
        }
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Process
    }

    async fn call(&self, method: &str, params: Value) -> ProviderResult<Value> {
        let (tx, rx) = oneshot::channel();
        self.handle
            .send_message(ProcessMessage::Call(ProviderCall {
                method: method.to_string(),
                params,
                timeout: self.timeout,
                response: tx,
            }))
            .await?;

        rx.await.map_err(|_| {
            tracing::warn!("[Provider {}] actor dropped the reply for '{}'", self.name, method);
            ProviderError::Closed
        })?
    }

    async fn close(&self) {
        let (tx, rx) = oneshot::channel();
        if self.handle.send_message(ProcessMessage::Shutdown(tx)).await.is_ok() {
            let _ = rx.await;
        }
    }
}
