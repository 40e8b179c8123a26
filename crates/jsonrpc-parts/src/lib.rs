//! # JSON-RPC 1.0 / 2.0 Building Blocks
//!
//! A transport-agnostic JSON-RPC implementation: message model, parser and
//! validator, serializer, method registry and a dispatcher with batch
//! support. Transports decode a body, hand it to [`JsonRpcDispatcher`] and
//! encode whatever comes back; the core never touches sockets or HTTP.
//!
//! ## Features
//! - JSON-RPC 2.0 including batches, plus JSON-RPC 1.0 messages
//! - Declared parameter contracts checked before handlers run
//! - Handler failures classified by a single error mapper
//! - Client-side request assembly and response validation
//!
//! ```rust
//! use jsonrpc_parts::prelude::*;
//! use serde_json::json;
//!
//! # async fn demo() {
//! let mut dispatcher: JsonRpcDispatcher = JsonRpcDispatcher::new();
//! dispatcher.registry_mut().register_sync_fn("add", |params| {
//!     let (a, b): (i64, i64) = params.parse()?;
//!     Ok(json!(a + b))
//! });
//!
//! let out = dispatcher
//!     .handle_request_string(r#"{"jsonrpc":"2.0","method":"add","params":[2,3],"id":1}"#)
//!     .await;
//! assert_eq!(out.as_deref(), Some(r#"{"jsonrpc":"2.0","result":5,"id":1}"#));
//! # }
//! ```

pub mod client;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod mapper;
pub mod message;
pub mod notification;
pub mod params;
pub mod parser;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod serializer;
pub mod types;

// Re-export main types
pub use client::{
    BuildError, ParsedResponse, RequestBuilder, ResponseParseError, ResponsePayload,
    parse_response, parse_response_str,
};
pub use dispatch::{DispatcherConfig, JsonRpcDispatcher, Metadata};
pub use error::{
    JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject, JsonRpcProcessingError, ToJsonRpcError,
};
pub use handler::{CallContext, FunctionHandler, JsonRpcHandler};
pub use mapper::{ErrorDetailPolicy, ErrorMapper};
pub use message::{BatchEntry, JsonRpcMessage, JsonRpcPayload};
pub use notification::JsonRpcNotification;
pub use params::{ParamKind, ParamShape, ParamSpec, Params};
pub use parser::{parse_json_rpc_message, parse_payload, parse_payload_slice, parse_payload_str};
pub use registry::{MethodEntry, MethodRegistry};
pub use request::{JsonRpcRequest, RequestParams};
pub use response::{JsonRpcMessageResult, JsonRpcReply, JsonRpcResponse};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server-defined codes in use
    pub const PROCEDURE_EXCEPTION: i64 = -32000;
    pub const AUTHENTICATION_ERROR: i64 = -32001;
    pub const PERMISSION_DENIED: i64 = -32002;
    pub const INVALID_PARAM_VALUES: i64 = -32003;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
