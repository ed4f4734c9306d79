use crate::error::ProviderResult;
use crate::session::manager::CleanupReport;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Duration;

#[derive(Debug)]
pub struct ProviderCall {
    pub method: String,
    pub params: Value,
    pub timeout: Duration,
    pub response: oneshot::Sender<ProviderResult<Value>>,
}

#[derive(Debug)]
pub enum ProcessMessage {
    Call(ProviderCall),
    Shutdown(oneshot::Sender<()>),
}

#[derive(Debug)]
pub enum SweeperMessage {
    /// Run one sweep now and report what was removed.
    SweepNow(oneshot::Sender<CleanupReport>),
    Shutdown,
}
