//! Session Sweeper Actor - periodic retention cleanup
//!
//! Information Hiding:
//! - Interval timing hidden inside the actor loop
//! - Retention window fixed at spawn time

use crate::actors::messages::SweeperMessage;
use crate::error::{ProviderError, ProviderResult};
use crate::session::manager::CleanupReport;
use crate::session::SessionManager;
use std::sync::Arc;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

pub struct SweeperHandle {
    sender: Sender<SweeperMessage>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn spawn(sessions: Arc<SessionManager>, interval: Duration, retention_days: i64) -> Self {
        let (sender, receiver) = channel(8);
        let task = tokio::spawn(sweeper_actor(receiver, sessions, interval, retention_days));
        Self { sender, task }
    }

    pub async fn sweep_now(&self) -> ProviderResult<CleanupReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SweeperMessage::SweepNow(tx))
            .await
            .map_err(|_| ProviderError::Closed)?;
        rx.await.map_err(|_| ProviderError::Closed)
    }

    pub async fn shutdown(self) {
        if self.sender.send(SweeperMessage::Shutdown).await.is_err() {
            tracing::debug!("[Sweeper] already stopped");
        }
        let _ = self.task.await;
    }
}

async fn sweeper_actor(
    mut receiver: Receiver<SweeperMessage>,
    sessions: Arc<SessionManager>,
    interval: Duration,
    retention_days: i64,
) {
    tracing::info!(
        "[Sweeper] started, every {:?}, retention {} days",
        interval,
        retention_days
    );

    loop {
        match timeout(interval, receiver.recv()).await {
            Ok(Some(SweeperMessage::SweepNow(reply))) => {
                let report = sessions.cleanup_old_sessions(retention_days).await;
                let _ = reply.send(report);
            }
            Ok(Some(SweeperMessage::Shutdown)) => {
                tracing::info!("[Sweeper] received shutdown signal");
                break;
            }
            Ok(None) => {
                tracing::info!("[Sweeper] channel closed");
                break;
            }
            Err(_) => {
                let report = sessions.cleanup_old_sessions(retention_days).await;
                tracing::debug!("[Sweeper] scheduled sweep: {:?}", report);
            }
        }
    }
}
