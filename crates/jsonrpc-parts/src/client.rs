//! Client-side helpers: assembling outbound calls and validating the
//! responses that come back.

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::JsonRpcErrorObject,
    message::JsonRpcMessage,
    notification::JsonRpcNotification,
    request::{JsonRpcRequest, RequestParams},
    types::{JsonRpcVersion, RequestId},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("method name must not be empty")]
    EmptyMethod,
    #[error("JSON-RPC 1.0 only supports positional params")]
    NamedParamsInV1,
    #[error("JSON-RPC 1.0 does not support batches")]
    BatchInV1,
}

/// Assembles requests and notifications with fresh ids.
///
/// In batch mode every assembled message is also collected; `finish_batch`
/// hands the collection back in call order.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    version: JsonRpcVersion,
    batch: Option<Vec<JsonRpcMessage>>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for 1.0 peers
    pub fn v1() -> Self {
        Self {
            version: JsonRpcVersion::V1_0,
            batch: None,
        }
    }

    pub fn version(&self) -> JsonRpcVersion {
        self.version
    }

    /// Request with a fresh UUID v4 id
    pub fn call(
        &mut self,
        method: &str,
        params: Option<RequestParams>,
    ) -> Result<JsonRpcRequest, BuildError> {
        let id = RequestId::String(Uuid::new_v4().to_string());
        self.call_with_id(id, method, params)
    }

    pub fn call_with_id(
        &mut self,
        id: RequestId,
        method: &str,
        params: Option<RequestParams>,
    ) -> Result<JsonRpcRequest, BuildError> {
        self.check(method, params.as_ref())?;
        let request =
            JsonRpcRequest::new(id, method.to_string(), params).with_version(self.version);
        self.collect(request.clone().into());
        Ok(request)
    }

    pub fn notify(
        &mut self,
        method: &str,
        params: Option<RequestParams>,
    ) -> Result<JsonRpcNotification, BuildError> {
        self.check(method, params.as_ref())?;
        let notification =
            JsonRpcNotification::new(method.to_string(), params).with_version(self.version);
        self.collect(notification.clone().into());
        Ok(notification)
    }

    /// Start collecting messages; anything collected earlier is dropped
    pub fn begin_batch(&mut self) -> Result<(), BuildError> {
        if self.version.is_v1() {
            return Err(BuildError::BatchInV1);
        }
        self.batch = Some(Vec::new());
        Ok(())
    }

    pub fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Leave batch mode, returning what was collected
    pub fn finish_batch(&mut self) -> Vec<JsonRpcMessage> {
        self.batch.take().unwrap_or_default()
    }

    fn check(&self, method: &str, params: Option<&RequestParams>) -> Result<(), BuildError> {
        if method.is_empty() {
            return Err(BuildError::EmptyMethod);
        }
        if self.version.is_v1() && params.is_some_and(RequestParams::is_named) {
            return Err(BuildError::NamedParamsInV1);
        }
        Ok(())
    }

    fn collect(&mut self, message: JsonRpcMessage) {
        if let Some(batch) = &mut self.batch {
            batch.push(message);
        }
    }
}

#[derive(Debug, Error)]
pub enum ResponseParseError {
    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response must be an object")]
    NotAnObject,
    #[error("response batch is empty")]
    EmptyBatch,
    #[error("response has no id")]
    MissingId,
    #[error("response id must be a string, number or null")]
    InvalidId,
    #[error("unsupported jsonrpc version {0}")]
    UnsupportedVersion(Value),
    #[error("response carries both result and error")]
    BothResultAndError,
    #[error("response carries neither result nor error")]
    MissingResultAndError,
    #[error("malformed error object: {0}")]
    MalformedError(&'static str),
}

/// A validated response
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub outcome: Result<Value, JsonRpcErrorObject>,
}

impl ParsedResponse {
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn into_result(self) -> Result<Value, JsonRpcErrorObject> {
        self.outcome
    }
}

#[derive(Debug)]
pub enum ResponsePayload {
    Single(ParsedResponse),
    /// Per-entry results, in the order the server sent them
    Batch(Vec<Result<ParsedResponse, ResponseParseError>>),
}

pub fn parse_response_str(text: &str) -> Result<ResponsePayload, ResponseParseError> {
    parse_response(serde_json::from_str(text)?)
}

/// Validate a decoded response body, single or batch
pub fn parse_response(value: Value) -> Result<ResponsePayload, ResponseParseError> {
    match value {
        Value::Array(entries) if entries.is_empty() => Err(ResponseParseError::EmptyBatch),
        Value::Array(entries) => Ok(ResponsePayload::Batch(
            entries.into_iter().map(parse_single).collect(),
        )),
        other => parse_single(other).map(ResponsePayload::Single),
    }
}

fn parse_single(value: Value) -> Result<ParsedResponse, ResponseParseError> {
    let Value::Object(mut obj) = value else {
        return Err(ResponseParseError::NotAnObject);
    };

    let version = match obj.remove("jsonrpc") {
        None => JsonRpcVersion::V1_0,
        Some(Value::String(tag)) if tag == "2.0" => JsonRpcVersion::V2_0,
        Some(other) => return Err(ResponseParseError::UnsupportedVersion(other)),
    };

    let id = obj.get("id").ok_or(ResponseParseError::MissingId)?;
    let id = RequestId::from_value(id).ok_or(ResponseParseError::InvalidId)?;

    let mut result = obj.remove("result");
    let mut error = obj.remove("error");
    // 1.0 responses always carry both members, the unused one as null
    if version.is_v1() {
        if error == Some(Value::Null) {
            error = None;
        } else if result == Some(Value::Null) {
            result = None;
        }
    }

    let outcome = match (result, error) {
        (Some(_), Some(_)) => return Err(ResponseParseError::BothResultAndError),
        (None, None) => return Err(ResponseParseError::MissingResultAndError),
        (Some(result), None) => Ok(result),
        (None, Some(error)) => Err(parse_error_object(error)?),
    };

    Ok(ParsedResponse {
        version,
        id,
        outcome,
    })
}

fn parse_error_object(value: Value) -> Result<JsonRpcErrorObject, ResponseParseError> {
    let Value::Object(mut obj) = value else {
        return Err(ResponseParseError::MalformedError("error must be an object"));
    };
    let code = obj
        .get("code")
        .and_then(Value::as_i64)
        .ok_or(ResponseParseError::MalformedError("code must be an integer"))?;
    let message = match obj.remove("message") {
        Some(Value::String(message)) => message,
        _ => return Err(ResponseParseError::MalformedError("message must be a string")),
    };
    Ok(JsonRpcErrorObject::custom(code, message, obj.remove("data")))
}
