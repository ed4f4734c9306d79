//! Process Provider Actor - owns one long-lived provider subprocess
//!
//! Information Hiding:
//! - Child process handles and buffered pipes never leave this task
//! - Strict request/response alternation enforced by the mailbox
//! - Dead or desynchronised channels are dropped and respawned on next use

use crate::actors::messages::*;
use crate::config::ProviderConfig;
use crate::core::protocol::{decode_response_line, RpcRequest};
use crate::error::{ProviderError, ProviderResult};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tokio::time::timeout;

pub struct ProcessActorHandle {
    sender: Sender<ProcessMessage>,
}

impl ProcessActorHandle {
    pub fn new(config: ProviderConfig, buffer_size: usize) -> Self {
        let (sender, receiver) = channel(buffer_size);
        tokio::spawn(process_actor(receiver, config));
        Self { sender }
    }

    pub async fn send_message(&self, message: ProcessMessage) -> ProviderResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| ProviderError::Closed)
    }
}

struct ChildChannel {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ChildChannel {
    fn spawn(config: &ProviderConfig) -> ProviderResult<Self> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .envs(&config.env)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ProviderError::Transport(format!("failed to spawn '{}': {}", config.command, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProviderError::Transport("failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProviderError::Transport("failed to get stdout".to_string()))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn exchange(&mut self, request: &RpcRequest) -> ProviderResult<Value> {
        let json = serde_json::to_string(request)
            .map_err(|e| ProviderError::Protocol(format!("failed to encode request: {}", e)))?;

        self.stdin
            .write_all(json.as_bytes())
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        self.stdin
            .write_all(b"\n")
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        if read == 0 {
            return Err(ProviderError::Closed);
        }

        decode_response_line(&line, request.id)
    }

    async fn terminate(mut self) {
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

async fn process_actor(mut receiver: Receiver<ProcessMessage>, config: ProviderConfig) {
    let mut channel = match ChildChannel::spawn(&config) {
        Ok(channel) => {
            tracing::info!("[Provider {}] process started: {}", config.name, config.command);
            Some(channel)
        }
        Err(e) => {
            tracing::warn!("[Provider {}] initial spawn failed, will retry on use: {}", config.name, e);
            None
        }
    };
    let mut request_id: u64 = 0;

    while let Some(message) = receiver.recv().await {
        match message {
            ProcessMessage::Call(call) => {
                if call.response.is_closed() {
                    tracing::debug!("[Provider {}] caller gave up on '{}', skipping", config.name, call.method);
                    continue;
                }
                request_id += 1;
                let result = handle_call(&config, &mut channel, request_id, &call).await;
                let _ = call.response.send(result);
            }
            ProcessMessage::Shutdown(ack) => {
                if let Some(channel) = channel.take() {
                    channel.terminate().await;
                }
                tracing::info!("[Provider {}] process actor shut down", config.name);
                let _ = ack.send(());
                return;
            }
        }
    }

    if let Some(channel) = channel.take() {
        channel.terminate().await;
    }
    tracing::info!("[Provider {}] mailbox closed, process actor stopped", config.name);
}

async fn handle_call(
    config: &ProviderConfig,
    slot: &mut Option<ChildChannel>,
    request_id: u64,
    call: &ProviderCall,
) -> ProviderResult<Value> {
    if let Some(existing) = slot.as_mut() {
        if !existing.is_alive() {
            tracing::warn!("[Provider {}] process exited, respawning", config.name);
            *slot = None;
        }
    }

    if slot.is_none() {
        *slot = Some(ChildChannel::spawn(config)?);
        tracing::info!("[Provider {}] process (re)started", config.name);
    }

    let Some(child) = slot.as_mut() else {
        return Err(ProviderError::Closed);
    };

    let request = RpcRequest::new(request_id, call.method.clone(), call.params.clone());

    let outcome = match timeout(call.timeout, child.exchange(&request)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(call.timeout.as_millis() as u64)),
    };

    if let Err(e) = &outcome {
        if e.is_transport() && !matches!(e, ProviderError::Remote { .. }) {
            tracing::warn!(
                "[Provider {}] dropping channel after '{}' failed: {}",
                config.name,
                call.method,
                e
            );
            if let Some(dead) = slot.take() {
                dead.terminate().await;
            }
        }
    }

    outcome
}
