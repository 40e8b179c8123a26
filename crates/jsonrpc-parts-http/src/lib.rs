//! # JSON-RPC over HTTP
//!
//! HTTP transport for [`jsonrpc_parts`]: a hyper based server that feeds
//! POST bodies to a [`JsonRpcDispatcher`] and a reqwest based client.
//!
//! ## Features
//! - POST only, on a single configurable path
//! - Optional `Content-Type: application/json` enforcement and body size limit
//! - `204 No Content` when a payload held nothing but notifications
//! - Permissive CORS with OPTIONS preflight

pub mod client;
pub mod cors;
pub mod handler;
pub mod server;

// Re-export main types
pub use client::{ClientConfig, HttpClientError, HttpRpcClient};
pub use cors::CorsLayer;
pub use handler::RpcHttpHandler;
pub use server::{HttpRpcServer, HttpRpcServerBuilder, ServerConfig};

// Re-export foundational types
pub use jsonrpc_parts::{JsonRpcDispatcher, JsonRpcHandler};

/// Result type for HTTP JSON-RPC server operations
pub type Result<T> = std::result::Result<T, HttpRpcError>;

/// HTTP server errors
#[derive(Debug, thiserror::Error)]
pub enum HttpRpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
