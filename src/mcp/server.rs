//! The central Model Context Protocol engine
//!
//! Decodes JSON-RPC messages, negotiates `initialize`, and routes
//! `tools/list` / `tools/call` to the registered [`ToolHandler`]s. Both
//! server binaries run this same engine; they differ only in the tools
//! they register before calling [`McpServer::serve`].

use std::{io, sync::Arc};

use rust_mcp_sdk::schema::{
    CallToolRequest, CallToolRequestParams, Implementation, InitializeRequest, InitializeResult,
    JsonrpcMessage, JsonrpcRequest, ListToolsRequest, ListToolsResult, PingRequest,
    ServerCapabilities, ServerCapabilitiesTools,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::errors::{AppError, FieldError, FieldProblem};
use crate::mcp::registry::{RegistryError, ToolHandler, ToolRegistry};
use crate::mcp::rpc::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_error_with_data,
    json_rpc_result, request_id_to_value, text_result, tool_error_result, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::mcp::transport::Transport;

/// Newest first; the first entry is offered when the client asks for a
/// version we don't speak.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub instructions: Option<String>,
}

pub struct McpServer {
    info: ServerInfo,
    tools: ToolRegistry,
}

impl McpServer {
    pub fn new(info: ServerInfo) -> Self {
        Self {
            info,
            tools: ToolRegistry::default(),
        }
    }

    pub fn register_tool(&mut self, handler: Arc<dyn ToolHandler>) -> Result<(), RegistryError> {
        let name = handler.descriptor().name;
        self.tools.register(handler)?;
        debug!(tool = %name, "tool registered");
        Ok(())
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answers messages one at a time until the transport reports EOF.
    pub async fn serve<T: Transport>(&self, transport: &mut T) -> io::Result<()> {
        info!(
            name = %self.info.name,
            version = %self.info.version,
            tools = self.tools.len(),
            "mcp server started"
        );

        while let Some(message) = transport.receive().await? {
            if let Some(response) = self.handle_message(&message).await {
                transport.send(&response).await?;
            }
        }

        info!("transport closed, mcp server shutting down");
        Ok(())
    }

    /// Handles one raw inbound message, single or batch. `None` means there
    /// is nothing to send back.
    pub async fn handle_message(&self, message: impl AsRef<[u8]>) -> Option<Value> {
        let payload: Value = match serde_json::from_slice(message.as_ref()) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "received malformed json-rpc message");
                return Some(json_rpc_error(None, PARSE_ERROR, "Parse error"));
            }
        };

        let Some(batch) = payload.as_array() else {
            return self.handle_json_rpc_value(payload).await;
        };

        if batch.is_empty() {
            return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
        }

        let mut responses = Vec::new();
        for item in batch {
            if let Some(response) = self.handle_json_rpc_value(item.clone()).await {
                responses.push(response);
            }
        }

        if responses.is_empty() {
            None
        } else {
            Some(Value::Array(responses))
        }
    }

    pub async fn handle_json_rpc_value(&self, payload: Value) -> Option<Value> {
        if !payload.is_object() {
            return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
        }

        let request_id = payload.get("id").cloned();
        let parsed: JsonrpcMessage = match serde_json::from_value(payload) {
            Ok(message) => message,
            Err(_) => return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
        };

        match parsed {
            JsonrpcMessage::Request(request) => {
                if let Err(error_response) = validate_request_shape(&request) {
                    return Some(error_response);
                }

                let request_id = request_id_to_value(request.id);
                if request.method.trim().is_empty() {
                    return Some(json_rpc_error(
                        Some(request_id),
                        INVALID_REQUEST,
                        "Invalid Request",
                    ));
                }

                Some(
                    self.handle_json_rpc_request(
                        Some(request_id),
                        request.method,
                        request.params.map(Value::Object),
                    )
                    .await,
                )
            }
            JsonrpcMessage::Notification(notification) => {
                debug!(method = %notification.method, "notification received");
                None
            }
            JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => {
                Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"))
            }
        }
    }

    pub async fn handle_json_rpc_request(
        &self,
        id: Option<Value>,
        method: String,
        params: Option<Value>,
    ) -> Value {
        let tool_name = params
            .as_ref()
            .filter(|_| method == "tools/call")
            .and_then(|params| params.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let response = match method.as_str() {
            "initialize" => self.handle_initialize(id, params.as_ref()),
            "ping" => json_rpc_result(id, json!({})),
            "tools/list" => json_rpc_result(
                id,
                serde_json::to_value(ListToolsResult {
                    meta: None,
                    next_cursor: None,
                    tools: self.tools.descriptors(),
                })
                .expect("tools list result serialization"),
            ),
            "tools/call" => self.handle_tools_call(id, params).await,
            _ => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
        };

        info!(
            method = %method,
            tool = tool_name.as_deref().unwrap_or("-"),
            outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
            "mcp request handled"
        );

        response
    }

    fn handle_initialize(&self, id: Option<Value>, params: Option<&Value>) -> Value {
        let protocol_version = match negotiate_protocol_version(params) {
            Ok(version) => version,
            Err(err) => return app_error_to_json_rpc(id, &err),
        };

        let initialize_result = InitializeResult {
            server_info: Implementation {
                name: self.info.name.clone(),
                version: self.info.version.clone(),
                title: None,
                description: None,
                icons: vec![],
                website_url: None,
            },
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            protocol_version: protocol_version.to_string(),
            instructions: self.info.instructions.clone(),
            meta: None,
        };

        json_rpc_result(
            id,
            serde_json::to_value(initialize_result).expect("initialize result serialization"),
        )
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> Value {
        let Some(raw_params) = params else {
            return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
        };

        let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
            Ok(value) => value,
            Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
        };

        let Some(handler) = self.tools.get(&tool_call.name) else {
            warn!(tool = %tool_call.name, "unknown tool requested");
            return json_rpc_error_with_data(
                id,
                METHOD_NOT_FOUND,
                "Method not found",
                Some(json!({
                    "code": "tool_not_found",
                    "message": "unknown tool name",
                    "details": {
                        "name": tool_call.name,
                    },
                })),
            );
        };

        let arguments = tool_call.arguments.unwrap_or_default();
        match handler.call(&arguments).await {
            Ok(text) => json_rpc_result(
                id,
                serde_json::to_value(text_result(text)).expect("tool result serialization"),
            ),
            Err(err) if err.is_validation() => {
                let arguments = Value::Object(arguments);
                warn!(
                    tool = %tool_call.name,
                    arguments = %arguments,
                    error = %err,
                    "tool call rejected"
                );
                app_error_to_json_rpc(id, &err)
            }
            Err(err) => {
                let arguments = Value::Object(arguments);
                error!(
                    tool = %tool_call.name,
                    arguments = %arguments,
                    code = err.code(),
                    error = %err,
                    "tool call failed"
                );
                json_rpc_result(
                    id,
                    serde_json::to_value(tool_error_result(&err))
                        .expect("tool error result serialization"),
                )
            }
        }
    }
}

pub fn validate_request_shape(request: &JsonrpcRequest) -> Result<(), Value> {
    let payload = serde_json::to_value(request).expect("jsonrpc request serialization");
    let request_id = Some(request_id_to_value(request.id.clone()));

    let valid = match request.method.as_str() {
        "tools/call" => serde_json::from_value::<CallToolRequest>(payload).is_ok(),
        "tools/list" => serde_json::from_value::<ListToolsRequest>(payload).is_ok(),
        "ping" => serde_json::from_value::<PingRequest>(payload).is_ok(),
        "initialize" => serde_json::from_value::<InitializeRequest>(payload).is_ok(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(json_rpc_error(request_id, INVALID_PARAMS, "Invalid params"))
    }
}

/// Echoes the client's version when supported, otherwise proposes the
/// newest one we speak and lets the client decide whether to continue.
pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<&'static str, AppError> {
    let offered_version = params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or_else(|| {
            AppError::validation(vec![FieldError {
                field: "protocolVersion",
                problem: FieldProblem::Missing,
            }])
        })?;

    Ok(SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|version| *version == offered_version)
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0]))
}
