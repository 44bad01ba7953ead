//! Tool surface exposed over the Model Context Protocol
//!
//! Declares the song/list/artist tools and dispatches `tools/call` requests
//! into the backend client.

pub mod search;
pub mod tools;
