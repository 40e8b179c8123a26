//! # JSON-RPC Prelude
//!
//! Re-exports of the most commonly used types.
//!
//! ```rust
//! use jsonrpc_parts::prelude::*;
//! ```

// Message model
pub use crate::error::{
    JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject, JsonRpcProcessingError, ToJsonRpcError,
};
pub use crate::message::{JsonRpcMessage, JsonRpcPayload};
pub use crate::notification::JsonRpcNotification;
pub use crate::request::{JsonRpcRequest, RequestParams};
pub use crate::response::{JsonRpcMessageResult, JsonRpcReply, JsonRpcResponse};
pub use crate::types::{JsonRpcVersion, RequestId};

// Dispatch
pub use crate::dispatch::{DispatcherConfig, JsonRpcDispatcher};
pub use crate::handler::{CallContext, FunctionHandler, JsonRpcHandler};
pub use crate::mapper::ErrorDetailPolicy;
pub use crate::params::{ParamKind, ParamShape, Params};
pub use crate::registry::MethodRegistry;

// Client side
pub use crate::client::{RequestBuilder, parse_response};

// Standard error codes
pub use crate::error_codes::*;
