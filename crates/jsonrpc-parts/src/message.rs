use serde::Serialize;

use crate::{
    error::JsonRpcError,
    notification::JsonRpcNotification,
    request::{JsonRpcRequest, RequestParams},
    types::{JsonRpcVersion, RequestId},
};

/// An inbound call: either a request or a notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

impl JsonRpcMessage {
    /// Get the method name
    pub fn method(&self) -> &str {
        match self {
            JsonRpcMessage::Request(req) => &req.method,
            JsonRpcMessage::Notification(notif) => &notif.method,
        }
    }

    pub fn params(&self) -> Option<&RequestParams> {
        match self {
            JsonRpcMessage::Request(req) => req.params.as_ref(),
            JsonRpcMessage::Notification(notif) => notif.params.as_ref(),
        }
    }

    pub fn version(&self) -> JsonRpcVersion {
        match self {
            JsonRpcMessage::Request(req) => req.version,
            JsonRpcMessage::Notification(notif) => notif.version,
        }
    }

    /// Check if this is a request (expects a response)
    pub fn is_request(&self) -> bool {
        matches!(self, JsonRpcMessage::Request(_))
    }

    /// Check if this is a notification (no response)
    pub fn is_notification(&self) -> bool {
        matches!(self, JsonRpcMessage::Notification(_))
    }

    /// Get the request ID if this is a request
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            JsonRpcMessage::Request(req) => Some(&req.id),
            JsonRpcMessage::Notification(_) => None,
        }
    }
}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(request: JsonRpcRequest) -> Self {
        JsonRpcMessage::Request(request)
    }
}

impl From<JsonRpcNotification> for JsonRpcMessage {
    fn from(notification: JsonRpcNotification) -> Self {
        JsonRpcMessage::Notification(notification)
    }
}

/// One element of a parsed batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEntry {
    Message(JsonRpcMessage),
    /// Broken element; keeps its slot as the error response it is answered with
    Invalid(JsonRpcError),
    /// Notification that failed validation; logged, never answered
    Discarded(JsonRpcError),
}

impl BatchEntry {
    pub fn message(&self) -> Option<&JsonRpcMessage> {
        match self {
            BatchEntry::Message(message) => Some(message),
            _ => None,
        }
    }

    /// The validation failure, answered or not
    pub fn error(&self) -> Option<&JsonRpcError> {
        match self {
            BatchEntry::Message(_) => None,
            BatchEntry::Invalid(error) | BatchEntry::Discarded(error) => Some(error),
        }
    }
}

/// Everything that arrived in one inbound payload
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcPayload {
    Single(JsonRpcMessage),
    Batch(Vec<BatchEntry>),
    /// A lone notification that failed validation
    Discarded(JsonRpcError),
}

impl JsonRpcPayload {
    pub fn is_batch(&self) -> bool {
        matches!(self, JsonRpcPayload::Batch(_))
    }

    /// Number of calls carried, broken batch elements included
    pub fn len(&self) -> usize {
        match self {
            JsonRpcPayload::Single(_) | JsonRpcPayload::Discarded(_) => 1,
            JsonRpcPayload::Batch(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_accessors() {
        let request: JsonRpcMessage = JsonRpcRequest::new_with_positional_params(
            RequestId::from(1i64),
            "add".to_string(),
            vec![json!(1)],
        )
        .into();
        assert!(request.is_request());
        assert_eq!(request.method(), "add");
        assert_eq!(request.request_id(), Some(&RequestId::from(1i64)));
        assert_eq!(request.params().map(|p| p.len()), Some(1));

        let notification: JsonRpcMessage =
            JsonRpcNotification::new_no_params("tick".to_string()).into();
        assert!(notification.is_notification());
        assert_eq!(notification.request_id(), None);
        assert_eq!(notification.version(), JsonRpcVersion::V2_0);
    }

    #[test]
    fn test_message_serializes_as_inner_type() {
        let message: JsonRpcMessage =
            JsonRpcNotification::new_no_params("tick".to_string()).into();
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"jsonrpc": "2.0", "method": "tick"})
        );
    }
}
