//! JSON-RPC protocol representations and formatting utilities
//!
//! Maps request-level `AppError`s onto JSON-RPC payloads and builds the
//! `CallToolResult` envelopes tools answer with.

use rust_mcp_sdk::schema::{
    CallToolResult, ContentBlock, JsonrpcErrorResponse, JsonrpcResultResponse, RequestId,
    Result as McpResult, RpcError, TextContent,
};
use serde_json::{json, Value};

use crate::errors::AppError;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: &AppError) -> Value {
    let (code, message) = match err {
        AppError::Validation { .. } => (INVALID_PARAMS, format!("Invalid params: {err}")),
        _ => (INTERNAL_ERROR, "Internal error".to_string()),
    };

    let details = match err {
        AppError::Validation { fields } => json!({
            "fields": fields
                .iter()
                .map(|field| field.field)
                .collect::<Vec<_>>(),
        }),
        _ => json!({}),
    };

    json_rpc_error_with_data(
        id,
        code,
        &message,
        Some(json!({
            "code": err.code(),
            "message": err.to_string(),
            "details": details,
        })),
    )
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let response = JsonrpcErrorResponse::new(
        RpcError {
            code: i64::from(code),
            data,
            message: message.to_string(),
        },
        id.as_ref().and_then(value_to_request_id),
    );
    serde_json::to_value(response).expect("jsonrpc error response serialization")
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        let response = JsonrpcResultResponse::new(request_id, McpResult { meta: None, extra });
        return serde_json::to_value(response).expect("jsonrpc result response serialization");
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn text_result(text: String) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text, None, None))],
        is_error: None,
        meta: None,
        structured_content: None,
    }
}

/// Tool failures travel inside a successful JSON-RPC response, flagged with
/// `isError`, so the calling model can read the message.
pub fn tool_error_result(err: &AppError) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(
            err.to_string(),
            None,
            None,
        ))],
        is_error: Some(true),
        meta: None,
        structured_content: None,
    }
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::Number(value.into()),
    }
}
