//! Turning replies and messages back into structured output.
//!
//! Member order is fixed by the types: `jsonrpc` (2.0 only), then `result`
//! or `error`, then `id`. `serde_json` runs with `preserve_order`, so the
//! same order survives into `Value` trees and encoding is deterministic.

use serde_json::Value;

use crate::{
    message::JsonRpcMessage,
    response::{JsonRpcMessageResult, JsonRpcReply},
};

/// Structured form of one reply
pub fn reply_to_value(reply: &JsonRpcReply) -> Result<Value, serde_json::Error> {
    serde_json::to_value(reply)
}

/// Structured form of a dispatch result; `None` means "write no body"
pub fn to_value(result: &JsonRpcMessageResult) -> Result<Option<Value>, serde_json::Error> {
    match result {
        JsonRpcMessageResult::Single(reply) => reply_to_value(reply).map(Some),
        JsonRpcMessageResult::Batch(replies) => serde_json::to_value(replies).map(Some),
        JsonRpcMessageResult::NoResponse => Ok(None),
    }
}

/// Text form of a dispatch result; `None` means "write no body"
pub fn to_string(result: &JsonRpcMessageResult) -> Result<Option<String>, serde_json::Error> {
    match result {
        JsonRpcMessageResult::Single(reply) => serde_json::to_string(reply).map(Some),
        JsonRpcMessageResult::Batch(replies) => serde_json::to_string(replies).map(Some),
        JsonRpcMessageResult::NoResponse => Ok(None),
    }
}

/// Byte form of a dispatch result; `None` means "write no body"
pub fn to_vec(result: &JsonRpcMessageResult) -> Result<Option<Vec<u8>>, serde_json::Error> {
    match result {
        JsonRpcMessageResult::Single(reply) => serde_json::to_vec(reply).map(Some),
        JsonRpcMessageResult::Batch(replies) => serde_json::to_vec(replies).map(Some),
        JsonRpcMessageResult::NoResponse => Ok(None),
    }
}

/// Structured form of an outbound call
pub fn message_to_value(message: &JsonRpcMessage) -> Result<Value, serde_json::Error> {
    serde_json::to_value(message)
}

/// Structured form of an outbound batch
pub fn batch_to_value(messages: &[JsonRpcMessage]) -> Result<Value, serde_json::Error> {
    serde_json::to_value(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JsonRpcError;
    use crate::parser::parse_message;
    use crate::types::RequestId;
    use serde_json::json;

    #[test]
    fn test_no_response_has_no_body() {
        let result = JsonRpcMessageResult::NoResponse;
        assert_eq!(to_value(&result).unwrap(), None);
        assert_eq!(to_string(&result).unwrap(), None);
        assert_eq!(to_vec(&result).unwrap(), None);
    }

    #[test]
    fn test_batch_is_an_array() {
        let result = JsonRpcMessageResult::Batch(vec![JsonRpcReply::success(
            RequestId::from(1i64),
            json!(2),
        )]);
        assert_eq!(
            to_string(&result).unwrap().unwrap(),
            r#"[{"jsonrpc":"2.0","result":2,"id":1}]"#
        );
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let result = JsonRpcMessageResult::Single(JsonRpcReply::success(
            RequestId::from("abc"),
            json!({"z": 1, "a": [1, 2], "m": {"y": null, "b": true}}),
        ));
        let first = to_vec(&result).unwrap().unwrap();
        let second = to_vec(&result).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_value_keeps_member_order() {
        let reply = JsonRpcReply::Error(JsonRpcError::parse_error());
        let value = reply_to_value(&reply).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["jsonrpc", "error", "id"]);
    }

    #[test]
    fn test_message_round_trip() {
        let inputs = [
            json!({"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": 7}),
            json!({"jsonrpc": "2.0", "method": "set", "params": {"b": 1, "a": 2}, "id": "x"}),
            json!({"jsonrpc": "2.0", "method": "tick"}),
            json!({"jsonrpc": "2.0", "method": "ping", "id": null}),
            json!({"method": "add", "params": [1], "id": 1}),
            json!({"method": "log", "params": ["x"], "id": null}),
        ];
        for input in inputs {
            let message = parse_message(input.clone()).unwrap();
            assert_eq!(message_to_value(&message).unwrap(), input);
        }
    }
}
