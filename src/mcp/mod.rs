// file: src/mcp/mod.rs
// description: MCP (Model Context Protocol) server for knowledge base retrieval
// reference: https://docs.rs/rmcp

pub mod server;
pub mod transport;

pub use server::{KnowledgeBaseMcp, RetrieveRequest, tool_description};
pub use transport::{serve_stdio, serve_streamable_http};
