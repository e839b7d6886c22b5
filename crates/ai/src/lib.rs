//! AI Interface (MCP Server)
//!
//! Exposes the study ledgers to an LLM agent as Model Context Protocol tools.

#![warn(missing_docs)]

pub mod tools;
pub mod mcp_server;

pub use tools::{ToolError, ToolRouter};
pub use mcp_server::{error_codes, McpError, McpRequest, McpResponse, McpServer, McpServerConfig, McpTool, MCP_VERSION};
