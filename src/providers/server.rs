//! Provider Server Loop - the leaf side of the wire contract
//!
//! Information Hiding:
//! - Line framing and JSON-RPC envelopes handled here
//! - Handlers only map (method, params) to a result object
//! - Parse errors and handler faults become protocol errors, never a crash

use crate::core::protocol::{RpcResponse, INTERNAL_ERROR, PARSE_ERROR};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Application logic of one Data Provider.
#[async_trait]
pub trait ProviderHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Methods this handler answers, for startup banners.
    fn methods(&self) -> Vec<&'static str>;

    /// `Ok(None)` means the method is not recognised.
    async fn handle(&self, method: &str, params: &Value) -> Result<Option<Value>>;
}

/// Turn one request line into exactly one response envelope.
pub async fn handle_line(handler: &dyn ProviderHandler, line: &str) -> RpcResponse {
    let request: Value = match serde_json::from_str(line.trim()) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("[{}] parse error: {}", handler.name(), e);
            return RpcResponse::failure(1, PARSE_ERROR, "Parse error", Some(e.to_string()));
        }
    };

    let id = request.get("id").and_then(Value::as_u64).unwrap_or(1);
    let method = request
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let params = match request.get("params") {
        Some(Value::Null) | None => json!({}),
        Some(params) => params.clone(),
    };

    match handler.handle(&method, &params).await {
        Ok(Some(result)) => RpcResponse::success(id, result),
        Ok(None) => RpcResponse::success(id, json!({ "error": format!("Unknown method: {}", method) })),
        Err(e) => {
            tracing::error!("[{}] internal error in {}: {:#}", handler.name(), method, e);
            RpcResponse::failure(id, INTERNAL_ERROR, "Internal error", Some(e.to_string()))
        }
    }
}

/// Serve requests until the reader reaches EOF.
pub async fn serve<R, W>(handler: &dyn ProviderHandler, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(handler, &line).await;
        let json = serde_json::to_string(&response)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    tracing::info!("[{}] input closed, shutting down", handler.name());
    Ok(())
}

pub async fn serve_stdio(handler: &dyn ProviderHandler) -> Result<()> {
    tracing::info!("[{}] provider started on stdio", handler.name());
    for method in handler.methods() {
        tracing::debug!("[{}]   - {}", handler.name(), method);
    }
    serve(handler, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl ProviderHandler for EchoHandler {
        fn name(&self) -> &str {
            "echo"
        }

        fn methods(&self) -> Vec<&'static str> {
            vec!["echo", "explode"]
        }

        async fn handle(&self, method: &str, params: &Value) -> Result<Option<Value>> {
            match method {
                "echo" => Ok(Some(params.clone())),
                "explode" => Err(anyhow::anyhow!("boom")),
                _ => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn test_echoes_request_id() {
        let response = handle_line(
            &EchoHandler,
            r#"{"jsonrpc":"2.0","id":42,"method":"echo","params":{"a":1}}"#,
        )
        .await;
        assert_eq!(response.id, Some(42));
        assert_eq!(response.result, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_parse_error_code() {
        let response = handle_line(&EchoHandler, "{not json").await;
        let error = response.error.unwrap();
        assert_eq!(error.code, PARSE_ERROR);
        assert_eq!(response.id, Some(1));
    }

    #[tokio::test]
    async fn test_unknown_method_inside_result() {
        let response = handle_line(&EchoHandler, r#"{"jsonrpc":"2.0","id":2,"method":"nope"}"#).await;
        assert!(response.error.is_none());
        assert_eq!(response.result, Some(json!({"error": "Unknown method: nope"})));
    }

    #[tokio::test]
    async fn test_handler_fault_is_internal_error() {
        let response = handle_line(&EchoHandler, r#"{"jsonrpc":"2.0","id":5,"method":"explode"}"#).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, INTERNAL_ERROR);
        assert_eq!(error.data.as_deref(), Some("boom"));
        assert_eq!(response.id, Some(5));
    }

    #[tokio::test]
    async fn test_serve_answers_each_line() {
        let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"echo\",\"params\":{}}\n\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"nope\"}\n";
        let mut output = Vec::new();

        serve(&EchoHandler, &input[..], &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"id\":1"));
        assert!(lines[1].contains("Unknown method: nope"));
    }
}
