//! Classification of handler failures into protocol errors.

use std::any::Any;
use std::error::Error as StdError;

use serde_json::json;
use tracing::{debug, error, warn};

use crate::error::{JsonRpcErrorCode, JsonRpcErrorObject, ToJsonRpcError};

/// How much of an internal fault is shown to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorDetailPolicy {
    /// Plain `Internal error`, nothing else
    #[default]
    Hide,
    /// The failure's text as message; method, text and cause chain in `data`
    Expose,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorMapper {
    policy: ErrorDetailPolicy,
}

impl ErrorMapper {
    pub fn new(policy: ErrorDetailPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ErrorDetailPolicy {
        self.policy
    }

    /// Map a handler's error. Declared protocol errors pass through verbatim.
    pub fn map<E: ToJsonRpcError>(&self, method: &str, err: &E) -> JsonRpcErrorObject {
        if let Some(declared) = err.to_error_object() {
            debug!(method, code = declared.code, "handler returned a protocol error");
            return declared;
        }

        warn!(method, error = %err, "handler failed");
        self.internal(method, err.to_string(), cause_chain(err))
    }

    /// Map a handler that panicked instead of returning
    pub fn map_panic(&self, method: &str, payload: &(dyn Any + Send)) -> JsonRpcErrorObject {
        let text = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "handler panicked".to_string());

        error!(method, panic = %text, "handler panicked");
        self.internal(method, text, Vec::new())
    }

    fn internal(&self, method: &str, message: String, causes: Vec<String>) -> JsonRpcErrorObject {
        match self.policy {
            ErrorDetailPolicy::Hide => JsonRpcErrorObject::internal_error(None),
            ErrorDetailPolicy::Expose => {
                let data = json!({ "method": method, "error": message, "causes": causes });
                JsonRpcErrorObject::new(JsonRpcErrorCode::InternalError, Some(message), Some(data))
            }
        }
    }
}

fn cause_chain(err: &dyn StdError) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}
