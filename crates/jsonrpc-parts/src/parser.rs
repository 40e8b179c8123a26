//! Parsing and validation of inbound payloads.
//!
//! Input is a decoded `serde_json::Value` tree (or raw text, for callers that
//! want `Parse error` classification too). Version rules are picked from the
//! `jsonrpc` member: present means 2.0 and must be exactly `"2.0"`, absent
//! means 1.0. Batches are 2.0 only; every element is validated on its own so
//! one broken element never spoils its siblings.

use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    error::{JsonRpcError, JsonRpcErrorObject},
    message::{BatchEntry, JsonRpcMessage, JsonRpcPayload},
    notification::JsonRpcNotification,
    request::{JsonRpcRequest, RequestParams},
    types::{JsonRpcVersion, RequestId},
};

const V1_MEMBERS: [&str; 3] = ["method", "params", "id"];

/// Parse a JSON string holding a single (non-batch) message
pub fn parse_json_rpc_message(json_str: &str) -> Result<JsonRpcMessage, JsonRpcError> {
    let value: Value = serde_json::from_str(json_str).map_err(|err| {
        debug!(error = %err, "payload is not valid JSON");
        JsonRpcError::parse_error()
    })?;
    parse_message(value)
}

/// Decode and parse a text payload, single message or batch
pub fn parse_payload_str(json_str: &str) -> Result<JsonRpcPayload, JsonRpcError> {
    parse_payload_slice(json_str.as_bytes())
}

/// Decode and parse a raw byte payload, single message or batch
pub fn parse_payload_slice(bytes: &[u8]) -> Result<JsonRpcPayload, JsonRpcError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|err| {
        debug!(error = %err, "payload is not valid JSON");
        JsonRpcError::parse_error()
    })?;
    parse_payload(value)
}

/// Parse an already decoded payload.
///
/// `Err` is the single top-level error response to send back (`Invalid
/// Request` for a non-object/non-array or an empty batch, or the validation
/// failure of a lone request). A lone notification that fails validation
/// comes back as [`JsonRpcPayload::Discarded`].
pub fn parse_payload(value: Value) -> Result<JsonRpcPayload, JsonRpcError> {
    match value {
        Value::Array(elements) if elements.is_empty() => Err(reject(
            JsonRpcVersion::V2_0,
            RequestId::Null,
            "empty batch",
        )),
        Value::Array(elements) => {
            debug!(size = elements.len(), "parsing batch");
            Ok(JsonRpcPayload::Batch(
                elements.into_iter().map(parse_batch_element).collect(),
            ))
        }
        Value::Object(_) => match classify(value) {
            BatchEntry::Message(message) => Ok(JsonRpcPayload::Single(message)),
            BatchEntry::Invalid(error) => Err(error),
            BatchEntry::Discarded(error) => Ok(JsonRpcPayload::Discarded(error)),
        },
        _ => Err(reject(
            JsonRpcVersion::V2_0,
            RequestId::Null,
            "payload is neither an object nor a batch array",
        )),
    }
}

/// Parse one message object, choosing 1.0 or 2.0 rules from its members
pub fn parse_message(value: Value) -> Result<JsonRpcMessage, JsonRpcError> {
    parse_object(value).map_err(Rejection::into_error)
}

/// A message that failed validation
enum Rejection {
    /// Answered with this error response
    Answer(JsonRpcError),
    /// Recognisably a notification, so never answered
    Drop(JsonRpcError),
}

impl Rejection {
    fn into_error(self) -> JsonRpcError {
        match self {
            Rejection::Answer(error) | Rejection::Drop(error) => error,
        }
    }
}

impl From<JsonRpcError> for Rejection {
    fn from(error: JsonRpcError) -> Self {
        Rejection::Answer(error)
    }
}

fn classify(value: Value) -> BatchEntry {
    match parse_object(value) {
        Ok(message) => BatchEntry::Message(message),
        Err(Rejection::Answer(error)) => BatchEntry::Invalid(error),
        Err(Rejection::Drop(error)) => BatchEntry::Discarded(error),
    }
}

fn parse_object(value: Value) -> Result<JsonRpcMessage, Rejection> {
    let Value::Object(obj) = value else {
        return Err(reject(
            JsonRpcVersion::V2_0,
            RequestId::Null,
            "message is not an object",
        )
        .into());
    };

    match detect_version(&obj)? {
        JsonRpcVersion::V1_0 => parse_v1(obj),
        JsonRpcVersion::V2_0 => parse_v2(obj),
    }
}

fn parse_batch_element(value: Value) -> BatchEntry {
    // 1.0 has no batches, so a version-less element inside one is invalid
    if let Value::Object(obj) = &value {
        if !obj.contains_key("jsonrpc") {
            return BatchEntry::Invalid(reject(
                JsonRpcVersion::V2_0,
                recover_id(obj),
                "batch element without jsonrpc 2.0 tag",
            ));
        }
    }
    classify(value)
}

fn detect_version(obj: &Map<String, Value>) -> Result<JsonRpcVersion, JsonRpcError> {
    match obj.get("jsonrpc") {
        None => Ok(JsonRpcVersion::V1_0),
        Some(Value::String(tag)) if tag == "2.0" => Ok(JsonRpcVersion::V2_0),
        Some(_) => Err(reject(
            JsonRpcVersion::V2_0,
            recover_id(obj),
            "unsupported jsonrpc version",
        )),
    }
}

fn parse_v2(mut obj: Map<String, Value>) -> Result<JsonRpcMessage, Rejection> {
    let version = JsonRpcVersion::V2_0;
    let id = match obj.get("id") {
        None => None,
        Some(raw) => Some(
            RequestId::from_value(raw)
                .ok_or_else(|| reject(version, RequestId::Null, "id must be a string, number or null"))?,
        ),
    };
    let error_id = id.clone().unwrap_or(RequestId::Null);

    let method = take_method(&mut obj, version, &error_id)?;
    let params = match obj.remove("params") {
        None => None,
        Some(raw) => match RequestParams::from_value(raw) {
            Some(params) => Some(params),
            None => {
                let error = bad_params(version, &error_id, "params must be an array or an object");
                return Err(if id.is_some() {
                    Rejection::Answer(error)
                } else {
                    Rejection::Drop(error)
                });
            }
        },
    };

    Ok(match id {
        Some(id) => JsonRpcMessage::Request(JsonRpcRequest {
            version,
            method,
            params,
            id,
        }),
        None => JsonRpcMessage::Notification(JsonRpcNotification {
            version,
            method,
            params,
        }),
    })
}

fn parse_v1(mut obj: Map<String, Value>) -> Result<JsonRpcMessage, Rejection> {
    let version = JsonRpcVersion::V1_0;
    let id = match obj.get("id") {
        None => return Err(reject(version, RequestId::Null, "id is required").into()),
        Some(raw) => RequestId::from_value(raw)
            .ok_or_else(|| reject(version, RequestId::Null, "id must be a string, number or null"))?,
    };

    if let Some(extra) = obj.keys().find(|key| !V1_MEMBERS.contains(&key.as_str())) {
        let reason = format!("unexpected member '{}'", extra);
        return Err(reject(version, id, &reason).into());
    }

    let method = take_method(&mut obj, version, &id)?;
    let params = match obj.remove("params") {
        None => None,
        Some(Value::Array(values)) => Some(RequestParams::Positional(values)),
        Some(_) => {
            let error = bad_params(version, &id, "params must be an array");
            return Err(if id.is_null() {
                Rejection::Drop(error)
            } else {
                Rejection::Answer(error)
            });
        }
    };

    Ok(if id.is_null() {
        JsonRpcMessage::Notification(JsonRpcNotification {
            version,
            method,
            params,
        })
    } else {
        JsonRpcMessage::Request(JsonRpcRequest {
            version,
            method,
            params,
            id,
        })
    })
}

fn take_method(
    obj: &mut Map<String, Value>,
    version: JsonRpcVersion,
    id: &RequestId,
) -> Result<String, JsonRpcError> {
    match obj.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => Ok(method),
        Some(Value::String(_)) => Err(reject(version, id.clone(), "method is empty")),
        Some(_) => Err(reject(version, id.clone(), "method must be a string")),
        None => Err(reject(version, id.clone(), "method is missing")),
    }
}

/// Best-effort id of a message that failed validation
fn recover_id(obj: &Map<String, Value>) -> RequestId {
    obj.get("id")
        .and_then(RequestId::from_value)
        .unwrap_or(RequestId::Null)
}

fn reject(version: JsonRpcVersion, id: RequestId, reason: &str) -> JsonRpcError {
    debug!(%id, reason, "invalid request");
    JsonRpcError::with_version(version, id, JsonRpcErrorObject::invalid_request(None))
}

fn bad_params(version: JsonRpcVersion, id: &RequestId, reason: &str) -> JsonRpcError {
    debug!(%id, reason, "invalid params");
    JsonRpcError::with_version(version, id.clone(), JsonRpcErrorObject::invalid_params(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_codes;
    use serde_json::json;

    fn code_of(result: Result<JsonRpcMessage, JsonRpcError>) -> i64 {
        result.unwrap_err().error.code
    }

    #[test]
    fn test_parse_valid_request() {
        let json = r#"{"jsonrpc": "2.0", "method": "test", "id": 1}"#;
        let message = parse_json_rpc_message(json).unwrap();

        assert!(message.is_request());
        assert_eq!(message.method(), "test");
        assert_eq!(message.request_id(), Some(&RequestId::from(1i64)));
        assert_eq!(message.version(), JsonRpcVersion::V2_0);
    }

    #[test]
    fn test_parse_valid_notification() {
        let json = r#"{"jsonrpc": "2.0", "method": "notify"}"#;
        let message = parse_json_rpc_message(json).unwrap();

        assert!(message.is_notification());
        assert_eq!(message.method(), "notify");
        assert_eq!(message.request_id(), None);
    }

    #[test]
    fn test_v2_null_id_is_a_request() {
        let message = parse_message(json!({"jsonrpc": "2.0", "method": "m", "id": null})).unwrap();
        assert_eq!(message.request_id(), Some(&RequestId::Null));
    }

    #[test]
    fn test_parse_invalid_json() {
        let json = r#"{"jsonrpc": "2.0", "method": "test""#;
        let error = parse_json_rpc_message(json).unwrap_err();

        assert_eq!(error.error.code, error_codes::PARSE_ERROR);
        assert_eq!(error.id, RequestId::Null);
    }

    #[test]
    fn test_parse_invalid_version() {
        let result = parse_message(json!({"jsonrpc": "1.0", "method": "test", "id": 1}));
        let error = result.unwrap_err();

        assert_eq!(error.error.code, error_codes::INVALID_REQUEST);
        assert_eq!(error.id, RequestId::from(1i64));
    }

    #[test]
    fn test_method_must_be_non_empty_string() {
        for bad in [json!(""), json!(5), json!(null)] {
            let result = parse_message(json!({"jsonrpc": "2.0", "method": bad, "id": 3}));
            let error = result.unwrap_err();
            assert_eq!(error.error.code, error_codes::INVALID_REQUEST);
            assert_eq!(error.id, RequestId::from(3i64));
        }
        assert_eq!(
            code_of(parse_message(json!({"jsonrpc": "2.0", "id": 3}))),
            error_codes::INVALID_REQUEST
        );
    }

    #[test]
    fn test_structured_id_is_rejected() {
        let error = parse_message(json!({"jsonrpc": "2.0", "method": "m", "id": [1]})).unwrap_err();
        assert_eq!(error.error.code, error_codes::INVALID_REQUEST);
        assert_eq!(error.id, RequestId::Null);
    }

    #[test]
    fn test_scalar_params_are_invalid_params() {
        let error =
            parse_message(json!({"jsonrpc": "2.0", "method": "m", "params": 4, "id": 9})).unwrap_err();
        assert_eq!(error.error.code, error_codes::INVALID_PARAMS);
        assert_eq!(error.id, RequestId::from(9i64));
    }

    #[test]
    fn test_v1_request() {
        let message = parse_message(json!({"method": "add", "params": [2, 3], "id": 1})).unwrap();
        assert!(message.is_request());
        assert_eq!(message.version(), JsonRpcVersion::V1_0);
    }

    #[test]
    fn test_v1_null_id_is_notification() {
        let message = parse_message(json!({"method": "log", "params": [], "id": null})).unwrap();
        assert!(message.is_notification());
        assert_eq!(message.version(), JsonRpcVersion::V1_0);
    }

    #[test]
    fn test_v1_rules() {
        // id is mandatory
        let error = parse_message(json!({"method": "add", "params": [1]})).unwrap_err();
        assert_eq!(error.error.code, error_codes::INVALID_REQUEST);
        assert!(error.version.is_v1());

        // named params are a 2.0 construct
        let error = parse_message(json!({"method": "add", "params": {"a": 1}, "id": 2})).unwrap_err();
        assert_eq!(error.error.code, error_codes::INVALID_PARAMS);
        assert_eq!(error.id, RequestId::from(2i64));

        // no members beyond method/params/id
        let error =
            parse_message(json!({"method": "add", "params": [], "id": 2, "extra": true})).unwrap_err();
        assert_eq!(error.error.code, error_codes::INVALID_REQUEST);
    }

    #[test]
    fn test_top_level_shapes() {
        for bad in [json!(1), json!("x"), json!(null), json!([])] {
            let error = parse_payload(bad).unwrap_err();
            assert_eq!(error.error.code, error_codes::INVALID_REQUEST);
            assert_eq!(error.id, RequestId::Null);
            assert_eq!(error.version, JsonRpcVersion::V2_0);
        }
    }

    #[test]
    fn test_batch_keeps_broken_elements_in_place() {
        let payload = parse_payload(json!([
            {"jsonrpc": "2.0", "method": "a", "id": 1},
            1,
            {"method": "legacy", "params": [], "id": 2},
            {"jsonrpc": "2.0", "method": "b"}
        ]))
        .unwrap();

        let JsonRpcPayload::Batch(entries) = payload else {
            panic!("expected a batch");
        };
        assert_eq!(entries.len(), 4);
        assert!(entries[0].message().unwrap().is_request());
        assert!(matches!(&entries[1], BatchEntry::Invalid(error) if error.id == RequestId::Null));
        let BatchEntry::Invalid(mixed) = &entries[2] else {
            panic!("expected an invalid entry");
        };
        assert_eq!(mixed.error.code, error_codes::INVALID_REQUEST);
        assert_eq!(mixed.id, RequestId::from(2i64));
        assert!(entries[3].message().unwrap().is_notification());
    }

    #[test]
    fn test_notification_with_bad_params_is_discarded() {
        let payload = parse_payload(json!({"jsonrpc": "2.0", "method": "add", "params": 5})).unwrap();
        let JsonRpcPayload::Discarded(error) = payload else {
            panic!("expected a discarded notification");
        };
        assert_eq!(error.error.code, error_codes::INVALID_PARAMS);

        let payload = parse_payload(json!({"method": "add", "params": {"a": 1}, "id": null})).unwrap();
        assert!(matches!(payload, JsonRpcPayload::Discarded(_)));

        // still reported to callers parsing a single message
        let error = parse_message(json!({"jsonrpc": "2.0", "method": "add", "params": 5})).unwrap_err();
        assert_eq!(error.error.code, error_codes::INVALID_PARAMS);
    }

    #[test]
    fn test_unrecognisable_notification_is_still_answered() {
        let error = parse_payload(json!({"jsonrpc": "2.0", "method": 7, "params": 5})).unwrap_err();
        assert_eq!(error.error.code, error_codes::INVALID_REQUEST);
        assert_eq!(error.id, RequestId::Null);

        let JsonRpcPayload::Batch(entries) = parse_payload(json!([
            {"jsonrpc": "2.0", "method": "add", "params": 5},
            {"jsonrpc": "2.0", "method": "", "params": [1]},
            {"jsonrpc": "2.0", "method": "add", "params": 5, "id": 4}
        ]))
        .unwrap() else {
            panic!("expected a batch");
        };
        assert!(matches!(&entries[0], BatchEntry::Discarded(_)));
        assert!(matches!(&entries[1], BatchEntry::Invalid(_)));
        assert!(matches!(&entries[2], BatchEntry::Invalid(error) if error.id == RequestId::from(4i64)));
    }

    #[test]
    fn test_parse_payload_str_classifies_garbage_as_parse_error() {
        let error = parse_payload_str("{not json").unwrap_err();
        assert_eq!(error.error.code, error_codes::PARSE_ERROR);
        assert!(parse_payload_slice(&[0xff, 0xfe]).is_err());
    }
}
