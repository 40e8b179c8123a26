use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::{request::RequestParams, types::JsonRpcVersion};

/// A JSON-RPC notification: a call that never gets a response.
///
/// 2.0 notifications simply have no `id`. 1.0 has no notification message of
/// its own; by convention a request with `"id": null` is one, so 1.0
/// notifications serialize with an explicit null id.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcNotification {
    pub version: JsonRpcVersion,
    pub method: String,
    pub params: Option<RequestParams>,
}

impl JsonRpcNotification {
    pub fn new(method: String, params: Option<RequestParams>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method,
            params,
        }
    }

    /// Create a new notification with no parameters
    pub fn new_no_params(method: String) -> Self {
        Self::new(method, None)
    }

    /// Create a new notification with named parameters
    pub fn new_with_named_params(method: String, params: Map<String, Value>) -> Self {
        Self::new(method, Some(RequestParams::Named(params)))
    }

    /// Create a new notification with positional parameters
    pub fn new_with_positional_params(method: String, params: Vec<Value>) -> Self {
        Self::new(method, Some(RequestParams::Positional(params)))
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

impl Serialize for JsonRpcNotification {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if !self.version.is_v1() {
            map.serialize_entry("jsonrpc", &self.version)?;
        }
        map.serialize_entry("method", &self.method)?;
        if let Some(params) = &self.params {
            map.serialize_entry("params", params)?;
        }
        if self.version.is_v1() {
            map.serialize_entry("id", &Value::Null)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_string};

    #[test]
    fn test_notification_json_format() {
        let notification = JsonRpcNotification::new_no_params("ping".to_string());
        let json_str = to_string(&notification).unwrap();

        assert_eq!(json_str, r#"{"jsonrpc":"2.0","method":"ping"}"#);
    }

    #[test]
    fn test_v1_notification_carries_null_id() {
        let notification =
            JsonRpcNotification::new_with_positional_params("log".to_string(), vec![json!("hi")])
                .with_version(JsonRpcVersion::V1_0);

        assert_eq!(
            to_string(&notification).unwrap(),
            r#"{"method":"log","params":["hi"],"id":null}"#
        );
    }

    #[test]
    fn test_notification_with_params() {
        let mut params = Map::new();
        params.insert("message".to_string(), json!("Hello"));
        params.insert("level".to_string(), json!("info"));

        let notification = JsonRpcNotification::new_with_named_params("log".to_string(), params);

        assert_eq!(notification.get_param("message"), Some(&json!("Hello")));
        assert_eq!(notification.get_param("level"), Some(&json!("info")));
        assert_eq!(notification.get_param_index(0), None);
    }
}
