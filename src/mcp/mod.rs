//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Provides the transport seam, the tool registry, and the protocol-level
//! validation, negotiation, formatting and routing shared by both servers.

pub mod registry;
pub mod rpc;
pub mod server;
pub mod transport;
