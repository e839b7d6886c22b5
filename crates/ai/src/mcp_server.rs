//! MCP Server for AI integration.
//!
//! Speaks newline-delimited JSON-RPC 2.0 over stdio and routes
//! `tools/call` requests to the study tools.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use studymate_progress::StudyService;
use studymate_storage::{open_store, StoreConfig};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, error, info, warn};

use crate::tools::{ToolError, ToolRouter};

/// MCP Protocol version
pub const MCP_VERSION: &str = "2024-11-05";

/// JSON-RPC error codes.
pub mod error_codes {
    /// Malformed JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// Not a valid request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Unknown method
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Bad method parameters
    pub const INVALID_PARAMS: i32 = -32602;
}

/// StudyMate MCP server configuration.
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    /// Store the tools operate on
    pub store: StoreConfig,
    /// Server name for MCP identification
    pub server_name: String,
    /// Server version
    pub version: String,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            server_name: "studymate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Tool definition for MCP protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpTool {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// Input schema for the tool
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// MCP Request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    /// Protocol tag, `2.0`
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Request id; absent for notifications. An explicit `null` is `Some(Null)`.
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Value,
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl McpRequest {
    /// Notifications expect no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// MCP Response message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    /// Protocol tag
    pub jsonrpc: String,
    /// Request id
    pub id: Value,
    /// Result data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

impl McpResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// MCP Error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    /// JSON-RPC error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Extra detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// StudyMate MCP server.
pub struct McpServer {
    /// Configuration
    config: McpServerConfig,
    /// Tool dispatch
    tools: ToolRouter,
}

impl McpServer {
    /// Create a new MCP server, opening the configured store.
    pub async fn with_config(config: McpServerConfig) -> anyhow::Result<Self> {
        let store = open_store(&config.store).await?;
        Ok(Self::with_service(config, StudyService::new(store)))
    }

    /// Create a server over an already wired service.
    pub fn with_service(config: McpServerConfig, service: StudyService) -> Self {
        Self {
            config,
            tools: ToolRouter::new(service),
        }
    }

    /// Handle one request. Returns `None` for notifications.
    pub async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => McpResponse::success(
                id,
                json!({
                    "protocolVersion": MCP_VERSION,
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": self.config.server_name,
                        "version": self.config.version
                    }
                }),
            ),

            "ping" => McpResponse::success(id, json!({})),

            "tools/list" => McpResponse::success(id, json!({ "tools": ToolRouter::definitions() })),

            "tools/call" => self.call_tool(id, request.params).await,

            other => {
                warn!("Unknown method: {}", other);
                McpResponse::failure(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method not found: {}", other),
                )
            }
        };
        Some(response)
    }

    async fn call_tool(&self, id: Value, params: Value) -> McpResponse {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return McpResponse::failure(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid tools/call params: {}", e),
                )
            }
        };

        match self.tools.call(&params.name, params.arguments).await {
            Ok(payload) => {
                let is_error = payload["status"] == "error";
                let text = serde_json::to_string_pretty(&payload).unwrap_or_default();
                McpResponse::success(
                    id,
                    json!({
                        "content": [{ "type": "text", "text": text }],
                        "structuredContent": payload,
                        "isError": is_error
                    }),
                )
            }
            Err(e @ ToolError::UnknownTool(_)) => {
                McpResponse::failure(id, error_codes::INVALID_PARAMS, e.to_string())
            }
        }
    }

    /// Handle one line of input. Returns the serialized response, if any.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Err(e) => {
                error!("Failed to parse request: {}", e);
                Some(McpResponse::failure(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
            Ok(value) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<McpRequest>(value) {
                    Ok(request) => self.handle_request(request).await,
                    Err(e) => Some(McpResponse::failure(
                        id,
                        error_codes::INVALID_REQUEST,
                        format!("Invalid request: {}", e),
                    )),
                }
            }
        };

        response.map(|r| {
            serde_json::to_string(&r).unwrap_or_else(|_| "{}".to_string())
        })
    }

    /// Start the MCP server with stdio transport.
    pub async fn start(&self) -> anyhow::Result<()> {
        info!(
            "Starting StudyMate MCP Server v{} (stdio transport)",
            self.config.version
        );
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = BufWriter::new(tokio::io::stdout());
        self.serve(stdin, stdout).await?;
        info!("MCP Server stopped");
        Ok(())
    }

    /// Serve requests from `reader` until end of input.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            if let Err(e) = writer.write_all(response.as_bytes()).await {
                error!("Failed to write response: {}", e);
                break;
            }
            if let Err(e) = writer.write_all(b"\n").await {
                error!("Failed to write newline: {}", e);
                break;
            }
            if let Err(e) = writer.flush().await {
                error!("Failed to flush: {}", e);
            }
        }
        Ok(())
    }
}
