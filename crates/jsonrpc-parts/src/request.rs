use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{JsonRpcVersion, RequestId};

/// Parameters for a JSON-RPC call
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// Positional parameters as an array
    Positional(Vec<Value>),
    /// Named parameters as an object (2.0 only)
    Named(Map<String, Value>),
}

impl RequestParams {
    /// Read structured params off the wire; scalars are not params
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(values) => Some(RequestParams::Positional(values)),
            Value::Object(map) => Some(RequestParams::Named(map)),
            _ => None,
        }
    }

    /// Get a parameter by name (named params only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Named(map) => map.get(key),
            RequestParams::Positional(_) => None,
        }
    }

    /// Get a parameter by index (positional params only)
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            RequestParams::Positional(values) => values.get(index),
            RequestParams::Named(_) => None,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, RequestParams::Named(_))
    }

    pub fn len(&self) -> usize {
        match self {
            RequestParams::Named(map) => map.len(),
            RequestParams::Positional(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_value(&self) -> Value {
        match self {
            RequestParams::Named(map) => Value::Object(map.clone()),
            RequestParams::Positional(values) => Value::Array(values.clone()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            RequestParams::Named(map) => Value::Object(map),
            RequestParams::Positional(values) => Value::Array(values),
        }
    }
}

impl From<Map<String, Value>> for RequestParams {
    fn from(map: Map<String, Value>) -> Self {
        RequestParams::Named(map)
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(values: Vec<Value>) -> Self {
        RequestParams::Positional(values)
    }
}

/// A JSON-RPC request: a call that expects exactly one correlated response.
///
/// Serializes as `jsonrpc`, `method`, `params`, `id`; 1.0 requests leave out
/// the `jsonrpc` member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc", skip_serializing_if = "JsonRpcVersion::is_v1")]
    pub version: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
    pub id: RequestId,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: String, params: Option<RequestParams>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method,
            params,
            id,
        }
    }

    /// Create a new request with no parameters
    pub fn new_no_params(id: RequestId, method: String) -> Self {
        Self::new(id, method, None)
    }

    /// Create a new request with named parameters
    pub fn new_with_named_params(
        id: RequestId,
        method: String,
        params: Map<String, Value>,
    ) -> Self {
        Self::new(id, method, Some(RequestParams::Named(params)))
    }

    /// Create a new request with positional parameters
    pub fn new_with_positional_params(id: RequestId, method: String, params: Vec<Value>) -> Self {
        Self::new(id, method, Some(RequestParams::Positional(params)))
    }

    pub fn with_version(mut self, version: JsonRpcVersion) -> Self {
        self.version = version;
        self
    }

    /// Get a parameter by name (if params are named)
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.get(name)
    }

    /// Get a parameter by index (if params are positional)
    pub fn get_param_index(&self, index: usize) -> Option<&Value> {
        self.params.as_ref()?.get_index(index)
    }
}
