//! JSON-RPC envelope shared by both sides of the provider channel
//!
//! Information Hiding:
//! - Envelope field names and error codes live here only
//! - Transports and the provider server loop exchange typed values

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";
pub const PARSE_ERROR: i64 = -32700;
pub const INTERNAL_ERROR: i64 = -32603;

/// Path appended to a provider's base URL for the HTTP transport.
pub const HTTP_CALL_PATH: &str = "/mcp/call";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorBody>,
}

impl RpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, code: i64, message: impl Into<String>, data: Option<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: None,
            error: Some(RpcErrorBody {
                code,
                message: message.into(),
                data,
            }),
        }
    }
}

/// Body of `POST {base_url}/mcp/call`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpCall {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Parse one response line and check it answers `expected_id`.
pub fn decode_response_line(line: &str, expected_id: u64) -> Result<Value, ProviderError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::Closed);
    }

    let response: RpcResponse = serde_json::from_str(trimmed)
        .map_err(|e| ProviderError::Protocol(format!("malformed response line: {}", e)))?;

    let id = response
        .id
        .ok_or_else(|| ProviderError::Protocol("response carries no id".to_string()))?;
    if id != expected_id {
        return Err(ProviderError::Protocol(format!(
            "response id {} does not match request id {}",
            id, expected_id
        )));
    }

    if let Some(error) = response.error {
        return Err(ProviderError::Remote {
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }

    match response.result {
        Some(result) => check_application_error(result),
        None => Err(ProviderError::Protocol(
            "response has neither result nor error".to_string(),
        )),
    }
}

/// A nominally successful result may still carry `{"error": "..."}`.
pub fn check_application_error(result: Value) -> Result<Value, ProviderError> {
    match result.get("error") {
        Some(Value::Null) | None => Ok(result),
        Some(Value::String(message)) => Err(ProviderError::Application(message.clone())),
        Some(other) => Err(ProviderError::Application(other.to_string())),
    }
}

/// Build a params object from key/value pairs, skipping `None` values.
pub fn params<const N: usize>(pairs: [(&str, Option<Value>); N]) -> Value {
    let mut map = Map::new();
    for (key, value) in pairs {
        if let Some(value) = value {
            map.insert(key.to_string(), value);
        }
    }
    Value::Object(map)
}
