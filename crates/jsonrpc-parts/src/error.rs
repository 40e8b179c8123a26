use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::error_codes;
use crate::types::{JsonRpcVersion, RequestId};

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ProcedureException,
    AuthenticationError,
    PermissionDenied,
    InvalidParamValues,
    ServerError(i64), // remaining codes in -32099 to -32000
    Application(i64), // anything outside the reserved block
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::ProcedureException => error_codes::PROCEDURE_EXCEPTION,
            JsonRpcErrorCode::AuthenticationError => error_codes::AUTHENTICATION_ERROR,
            JsonRpcErrorCode::PermissionDenied => error_codes::PERMISSION_DENIED,
            JsonRpcErrorCode::InvalidParamValues => error_codes::INVALID_PARAM_VALUES,
            JsonRpcErrorCode::ServerError(code) | JsonRpcErrorCode::Application(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
            JsonRpcErrorCode::ProcedureException => "Procedure exception",
            JsonRpcErrorCode::AuthenticationError => "Authentication error",
            JsonRpcErrorCode::PermissionDenied => "Permission denied",
            JsonRpcErrorCode::InvalidParamValues => "Invalid parameter values",
            JsonRpcErrorCode::ServerError(_) => "Server error",
            JsonRpcErrorCode::Application(_) => "Application error",
        }
    }

    /// Classify a raw wire code
    pub fn from_code(code: i64) -> Self {
        match code {
            error_codes::PARSE_ERROR => JsonRpcErrorCode::ParseError,
            error_codes::INVALID_REQUEST => JsonRpcErrorCode::InvalidRequest,
            error_codes::METHOD_NOT_FOUND => JsonRpcErrorCode::MethodNotFound,
            error_codes::INVALID_PARAMS => JsonRpcErrorCode::InvalidParams,
            error_codes::INTERNAL_ERROR => JsonRpcErrorCode::InternalError,
            error_codes::PROCEDURE_EXCEPTION => JsonRpcErrorCode::ProcedureException,
            error_codes::AUTHENTICATION_ERROR => JsonRpcErrorCode::AuthenticationError,
            error_codes::PERMISSION_DENIED => JsonRpcErrorCode::PermissionDenied,
            error_codes::INVALID_PARAM_VALUES => JsonRpcErrorCode::InvalidParamValues,
            c if (error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END).contains(&c) => {
                JsonRpcErrorCode::ServerError(c)
            }
            c => JsonRpcErrorCode::Application(c),
        }
    }

    /// True for the five codes every JSON-RPC 2.0 peer must understand
    pub fn is_standard(&self) -> bool {
        matches!(
            self,
            JsonRpcErrorCode::ParseError
                | JsonRpcErrorCode::InvalidRequest
                | JsonRpcErrorCode::MethodNotFound
                | JsonRpcErrorCode::InvalidParams
                | JsonRpcErrorCode::InternalError
        )
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, message: Option<String>, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            data,
        }
    }

    pub fn parse_error(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::ParseError, None, data)
    }

    pub fn invalid_request(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidRequest, None, data)
    }

    pub fn method_not_found() -> Self {
        Self::new(JsonRpcErrorCode::MethodNotFound, None, None)
    }

    /// Invalid params, with the reason carried in `data`
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(
            JsonRpcErrorCode::InvalidParams,
            None,
            Some(Value::String(detail.into())),
        )
    }

    pub fn internal_error(message: Option<String>) -> Self {
        Self::new(JsonRpcErrorCode::InternalError, message, None)
    }

    pub fn procedure_exception(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::ProcedureException, None, data)
    }

    pub fn authentication_error(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::AuthenticationError, None, data)
    }

    pub fn permission_denied(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::PermissionDenied, None, data)
    }

    pub fn invalid_param_values(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidParamValues, None, data)
    }

    pub fn server_error(code: i64, message: &str, data: Option<Value>) -> Self {
        debug_assert!(
            (error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END).contains(&code),
            "Server error code must be in range -32099 to -32000"
        );
        Self::new(
            JsonRpcErrorCode::ServerError(code),
            Some(message.to_string()),
            data,
        )
    }

    /// An application-defined error with an arbitrary code
    pub fn custom(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn kind(&self) -> JsonRpcErrorCode {
        JsonRpcErrorCode::from_code(self.code)
    }
}

impl fmt::Display for JsonRpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// JSON-RPC Error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(
        rename = "jsonrpc",
        default = "JsonRpcVersion::legacy",
        skip_serializing_if = "JsonRpcVersion::is_v1"
    )]
    pub version: JsonRpcVersion,
    pub error: JsonRpcErrorObject,
    pub id: RequestId,
}

impl JsonRpcError {
    pub fn new(id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self::with_version(JsonRpcVersion::V2_0, id, error)
    }

    pub fn with_version(version: JsonRpcVersion, id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self { version, error, id }
    }

    pub fn parse_error() -> Self {
        Self::new(RequestId::Null, JsonRpcErrorObject::parse_error(None))
    }

    pub fn invalid_request(id: RequestId) -> Self {
        Self::new(id, JsonRpcErrorObject::invalid_request(None))
    }

    pub fn method_not_found(id: RequestId) -> Self {
        Self::new(id, JsonRpcErrorObject::method_not_found())
    }

    pub fn invalid_params(id: RequestId, detail: &str) -> Self {
        Self::new(id, JsonRpcErrorObject::invalid_params(detail))
    }

    pub fn internal_error(id: RequestId, message: Option<String>) -> Self {
        Self::new(id, JsonRpcErrorObject::internal_error(message))
    }

    pub fn code(&self) -> i64 {
        self.error.code
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JSON-RPC Error {}: {}",
            self.error.code, self.error.message
        )
    }
}

impl std::error::Error for JsonRpcError {}

/// Domain errors that know how they should appear on the wire.
///
/// `None` marks an internal fault: the dispatcher reports it as
/// `Internal error` and the detail exposure policy decides what leaks.
pub trait ToJsonRpcError: std::error::Error + Send + Sync + 'static {
    fn to_error_object(&self) -> Option<JsonRpcErrorObject>;
}

/// Stock error type for handlers without a domain error of their own
#[derive(Debug, Error)]
pub enum JsonRpcProcessingError {
    /// Declared protocol error, passed to the caller verbatim
    #[error("{0}")]
    Rpc(JsonRpcErrorObject),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Handler error: {0}")]
    HandlerError(String),

    /// The surrounding transport gave up on the call
    #[error("Call aborted: {0}")]
    Aborted(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToJsonRpcError for JsonRpcProcessingError {
    fn to_error_object(&self) -> Option<JsonRpcErrorObject> {
        match self {
            JsonRpcProcessingError::Rpc(error) => Some(error.clone()),
            JsonRpcProcessingError::InvalidParams(detail) => {
                Some(JsonRpcErrorObject::invalid_params(detail.clone()))
            }
            JsonRpcProcessingError::HandlerError(_)
            | JsonRpcProcessingError::Aborted(_)
            | JsonRpcProcessingError::Serialization(_) => None,
        }
    }
}

impl From<JsonRpcErrorObject> for JsonRpcProcessingError {
    fn from(error: JsonRpcErrorObject) -> Self {
        JsonRpcProcessingError::Rpc(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes() {
        assert_eq!(JsonRpcErrorCode::ParseError.code(), -32700);
        assert_eq!(JsonRpcErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(JsonRpcErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(JsonRpcErrorCode::InvalidParams.code(), -32602);
        assert_eq!(JsonRpcErrorCode::InternalError.code(), -32603);
        assert_eq!(JsonRpcErrorCode::PermissionDenied.code(), -32002);
    }

    #[test]
    fn test_code_classification() {
        assert_eq!(
            JsonRpcErrorCode::from_code(-32601),
            JsonRpcErrorCode::MethodNotFound
        );
        assert_eq!(
            JsonRpcErrorCode::from_code(-32003),
            JsonRpcErrorCode::InvalidParamValues
        );
        assert_eq!(
            JsonRpcErrorCode::from_code(-32050),
            JsonRpcErrorCode::ServerError(-32050)
        );
        assert_eq!(JsonRpcErrorCode::from_code(42), JsonRpcErrorCode::Application(42));
        assert!(JsonRpcErrorCode::InvalidParams.is_standard());
        assert!(!JsonRpcErrorCode::ServerError(-32010).is_standard());
    }

    #[test]
    fn test_error_serialization() {
        let error = JsonRpcError::method_not_found(RequestId::from(1i64));
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(
            json,
            r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":1}"#
        );
    }

    #[test]
    fn test_v1_error_omits_version() {
        let error = JsonRpcError::with_version(
            JsonRpcVersion::V1_0,
            RequestId::from("a"),
            JsonRpcErrorObject::internal_error(None),
        );
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(
            value,
            json!({"error": {"code": -32603, "message": "Internal error"}, "id": "a"})
        );
    }

    #[test]
    fn test_processing_error_classification() {
        let declared = JsonRpcProcessingError::from(JsonRpcErrorObject::custom(7, "nope", None));
        assert_eq!(declared.to_error_object().unwrap().code, 7);

        let params = JsonRpcProcessingError::InvalidParams("a is required".into());
        let object = params.to_error_object().unwrap();
        assert_eq!(object.code, -32602);
        assert_eq!(object.data, Some(json!("a is required")));

        assert!(JsonRpcProcessingError::HandlerError("db down".into())
            .to_error_object()
            .is_none());
        assert!(JsonRpcProcessingError::Aborted("client went away".into())
            .to_error_object()
            .is_none());
    }
}
