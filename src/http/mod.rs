//! HTTP Transport layer for the Model Context Protocol
//!
//! Provides the external API routing, including the streaming `/mcp` listener,
//! the legacy `/sse` + `/messages` pair, and the metadata endpoints.

pub mod handlers;
