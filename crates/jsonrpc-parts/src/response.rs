use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::JsonRpcError;
use crate::types::{JsonRpcVersion, RequestId};

/// A successful JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(
        rename = "jsonrpc",
        default = "JsonRpcVersion::legacy",
        skip_serializing_if = "JsonRpcVersion::is_v1"
    )]
    pub version: JsonRpcVersion,
    pub result: Value,
    pub id: RequestId,
}

impl JsonRpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self::with_version(JsonRpcVersion::V2_0, id, result)
    }

    pub fn with_version(version: JsonRpcVersion, id: RequestId, result: Value) -> Self {
        Self {
            version,
            result,
            id,
        }
    }

    /// Response for a method with nothing to return
    pub fn null(id: RequestId) -> Self {
        Self::new(id, Value::Null)
    }
}

impl<T> From<(RequestId, T)> for JsonRpcResponse
where
    T: Into<Value>,
{
    fn from((id, result): (RequestId, T)) -> Self {
        Self::new(id, result.into())
    }
}

/// Either a successful response or an error response.
/// Keeping them as separate types guarantees exactly one of `result`/`error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcReply {
    /// Successful response with result field
    Success(JsonRpcResponse),
    /// Error response with error field
    Error(JsonRpcError),
}

impl JsonRpcReply {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Success(JsonRpcResponse::new(id, result))
    }

    pub fn error(error: JsonRpcError) -> Self {
        Self::Error(error)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcReply::Error(_))
    }

    pub fn id(&self) -> &RequestId {
        match self {
            JsonRpcReply::Success(resp) => &resp.id,
            JsonRpcReply::Error(err) => &err.id,
        }
    }

    pub fn version(&self) -> JsonRpcVersion {
        match self {
            JsonRpcReply::Success(resp) => resp.version,
            JsonRpcReply::Error(err) => err.version,
        }
    }
}

impl From<JsonRpcResponse> for JsonRpcReply {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Success(response)
    }
}

impl From<JsonRpcError> for JsonRpcReply {
    fn from(error: JsonRpcError) -> Self {
        Self::Error(error)
    }
}

/// What the dispatcher hands back to the transport for one payload
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcMessageResult {
    /// Reply to a single (non-batch) message
    Single(JsonRpcReply),
    /// Replies to a batch, in request order, notifications left out
    Batch(Vec<JsonRpcReply>),
    /// Nothing to send: the transport must not write a body at all
    NoResponse,
}

impl JsonRpcMessageResult {
    /// Encode for the wire; `None` when there is nothing to send
    pub fn to_json_string(&self) -> Result<Option<String>, serde_json::Error> {
        crate::serializer::to_string(self)
    }

    /// Check if this result is a single error response
    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcMessageResult::Single(reply) if reply.is_error())
    }

    /// Check if this result needs a response
    pub fn needs_response(&self) -> bool {
        !matches!(self, JsonRpcMessageResult::NoResponse)
    }

    pub fn replies(&self) -> &[JsonRpcReply] {
        match self {
            JsonRpcMessageResult::Single(reply) => std::slice::from_ref(reply),
            JsonRpcMessageResult::Batch(replies) => replies,
            JsonRpcMessageResult::NoResponse => &[],
        }
    }

    pub fn into_replies(self) -> Vec<JsonRpcReply> {
        match self {
            JsonRpcMessageResult::Single(reply) => vec![reply],
            JsonRpcMessageResult::Batch(replies) => replies,
            JsonRpcMessageResult::NoResponse => Vec::new(),
        }
    }
}
