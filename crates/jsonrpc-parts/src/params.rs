//! Declared parameter contracts and the params view handed to handlers.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{error::JsonRpcProcessingError, request::RequestParams};

/// Expected JSON type of a declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamKind {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::Any => true,
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Array => value.is_array(),
            ParamKind::Object => value.is_object(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Any => "any",
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
}

/// Parameter contract of a method.
///
/// Parameters are declared in positional order, so the same contract checks
/// both an array (by index) and an object (by name). Without `variadic`,
/// surplus positional values are rejected; without `allow_extra_named`,
/// unknown names are rejected. An optional parameter accepts `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamShape {
    params: Vec<ParamSpec>,
    variadic: bool,
    extra_named: bool,
}

impl ParamShape {
    /// A method that takes no parameters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    /// Accept any number of extra positional values
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Accept named values that are not declared
    pub fn allow_extra_named(mut self) -> Self {
        self.extra_named = true;
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|spec| spec.name == name)
    }

    /// Check call params against the contract; `Err` carries the reason
    pub fn validate(&self, params: Option<&RequestParams>) -> Result<(), String> {
        match params {
            None => self.check_each(|_| None),
            Some(RequestParams::Positional(values)) => {
                if !self.variadic && values.len() > self.params.len() {
                    return Err(format!(
                        "expected at most {} positional parameters, got {}",
                        self.params.len(),
                        values.len()
                    ));
                }
                self.check_each(|index| values.get(index))
            }
            Some(RequestParams::Named(map)) => {
                if !self.extra_named {
                    if let Some(unknown) = map.keys().find(|key| self.position_of(key).is_none()) {
                        return Err(format!("unexpected parameter '{}'", unknown));
                    }
                }
                self.check_each(|index| map.get(&self.params[index].name))
            }
        }
    }

    fn check_each<'a>(&self, lookup: impl Fn(usize) -> Option<&'a Value>) -> Result<(), String> {
        for (index, spec) in self.params.iter().enumerate() {
            match lookup(index) {
                None if spec.required => {
                    return Err(format!("missing required parameter '{}'", spec.name));
                }
                None => {}
                Some(Value::Null) if !spec.required => {}
                Some(value) if !spec.kind.matches(value) => {
                    return Err(format!(
                        "parameter '{}' must be of type {}",
                        spec.name,
                        spec.kind.as_str()
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Call parameters as seen by a handler.
///
/// When the method declared a [`ParamShape`], values can be looked up by
/// declared name or position regardless of how the caller sent them.
#[derive(Debug, Clone, Default)]
pub struct Params {
    raw: Option<RequestParams>,
    shape: Option<Arc<ParamShape>>,
}

impl Params {
    pub fn new(raw: Option<RequestParams>) -> Self {
        Self { raw, shape: None }
    }

    pub(crate) fn with_shape(raw: Option<RequestParams>, shape: Option<Arc<ParamShape>>) -> Self {
        Self { raw, shape }
    }

    pub fn raw(&self) -> Option<&RequestParams> {
        self.raw.as_ref()
    }

    pub fn into_raw(self) -> Option<RequestParams> {
        self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.as_ref().map_or(0, RequestParams::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positional values; empty when params were named or absent
    pub fn positional(&self) -> &[Value] {
        match &self.raw {
            Some(RequestParams::Positional(values)) => values,
            _ => &[],
        }
    }

    pub fn named(&self) -> Option<&Map<String, Value>> {
        match &self.raw {
            Some(RequestParams::Named(map)) => Some(map),
            _ => None,
        }
    }

    /// Look a parameter up by name, falling back to its declared position
    pub fn get(&self, name: &str) -> Option<&Value> {
        match &self.raw {
            Some(RequestParams::Named(map)) => map.get(name),
            Some(RequestParams::Positional(values)) => {
                let index = self.shape.as_ref()?.position_of(name)?;
                values.get(index)
            }
            None => None,
        }
    }

    /// Look a parameter up by position, falling back to its declared name
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match &self.raw {
            Some(RequestParams::Positional(values)) => values.get(index),
            Some(RequestParams::Named(map)) => {
                let spec = self.shape.as_ref()?.params().get(index)?;
                map.get(&spec.name)
            }
            None => None,
        }
    }

    /// Deserialize a required parameter
    pub fn required<T: DeserializeOwned>(&self, name: &str) -> Result<T, JsonRpcProcessingError> {
        let value = self.get(name).ok_or_else(|| {
            JsonRpcProcessingError::InvalidParams(format!("missing required parameter '{}'", name))
        })?;
        decode(name, value.clone())
    }

    /// Deserialize an optional parameter; `null` counts as absent
    pub fn optional<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, JsonRpcProcessingError> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(name, value.clone()).map(Some),
        }
    }

    /// Deserialize the whole params structure: an array into a tuple or
    /// sequence, an object into a struct or map. Absent params decode as an
    /// empty array.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, JsonRpcProcessingError> {
        let value = self
            .raw
            .as_ref()
            .map_or_else(|| Value::Array(Vec::new()), RequestParams::to_value);
        serde_json::from_value(value)
            .map_err(|err| JsonRpcProcessingError::InvalidParams(err.to_string()))
    }
}

fn decode<T: DeserializeOwned>(name: &str, value: Value) -> Result<T, JsonRpcProcessingError> {
    serde_json::from_value(value).map_err(|err| {
        JsonRpcProcessingError::InvalidParams(format!("parameter '{}': {}", name, err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn params_of(values: Value) -> RequestParams {
        RequestParams::from_value(values).unwrap()
    }

    fn add_shape() -> ParamShape {
        ParamShape::new()
            .required("a", ParamKind::Number)
            .required("b", ParamKind::Number)
    }

    #[test]
    fn test_arity_checks() {
        let shape = add_shape();
        assert!(shape.validate(Some(&params_of(json!([1, 2])))).is_ok());
        assert_eq!(
            shape.validate(Some(&params_of(json!([1])))).unwrap_err(),
            "missing required parameter 'b'"
        );
        assert!(shape.validate(Some(&params_of(json!([1, 2, 3])))).is_err());
        assert!(shape.validate(None).is_err());
    }

    #[test]
    fn test_named_checks() {
        let shape = add_shape();
        assert!(shape.validate(Some(&params_of(json!({"b": 1, "a": 2})))).is_ok());
        assert_eq!(
            shape
                .validate(Some(&params_of(json!({"a": 1, "b": 2, "c": 3}))))
                .unwrap_err(),
            "unexpected parameter 'c'"
        );
        assert!(shape
            .clone()
            .allow_extra_named()
            .validate(Some(&params_of(json!({"a": 1, "b": 2, "c": 3}))))
            .is_ok());
    }

    #[test]
    fn test_type_checks() {
        let shape = add_shape().optional("label", ParamKind::String);
        assert_eq!(
            shape.validate(Some(&params_of(json!([1, "x"])))).unwrap_err(),
            "parameter 'b' must be of type number"
        );
        assert!(shape.validate(Some(&params_of(json!([1, 2, null])))).is_ok());
        assert!(shape.validate(Some(&params_of(json!([1, 2, 3])))).is_err());
    }

    #[test]
    fn test_variadic_accepts_surplus() {
        let shape = ParamShape::new().variadic();
        assert!(shape.validate(Some(&params_of(json!([1, 2, 3, 4])))).is_ok());
        assert!(shape.validate(None).is_ok());
        assert!(ParamShape::new().validate(Some(&params_of(json!([1])))).is_err());
    }

    #[test]
    fn test_lookup_through_shape() {
        let shape = Arc::new(add_shape());

        let by_position = Params::with_shape(Some(params_of(json!([4, 5]))), Some(shape.clone()));
        assert_eq!(by_position.get("b"), Some(&json!(5)));
        assert_eq!(by_position.required::<i64>("a").unwrap(), 4);

        let by_name = Params::with_shape(Some(params_of(json!({"a": 7, "b": 8}))), Some(shape));
        assert_eq!(by_name.get_index(1), Some(&json!(8)));
        assert_eq!(by_name.optional::<i64>("c").unwrap(), None);

        let unshaped = Params::new(Some(params_of(json!([1]))));
        assert_eq!(unshaped.get("a"), None);
    }

    #[test]
    fn test_parse_whole_params() {
        #[derive(Deserialize)]
        struct Pair {
            a: i64,
            b: i64,
        }

        let named = Params::new(Some(params_of(json!({"a": 1, "b": 2}))));
        let pair: Pair = named.parse().unwrap();
        assert_eq!(pair.a + pair.b, 3);

        let numbers: Vec<f64> = Params::new(None).parse().unwrap();
        assert!(numbers.is_empty());

        let wrong = Params::new(Some(params_of(json!(["x"]))));
        assert!(matches!(
            wrong.parse::<Vec<i64>>(),
            Err(JsonRpcProcessingError::InvalidParams(_))
        ));
    }
}
