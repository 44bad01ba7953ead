//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Provides protocol-level specifics surrounding JSON-RPC validation, negotiation,
//! formatting, routing, and transport session lifecycle.

pub mod rpc;
pub mod server;
pub mod session;
