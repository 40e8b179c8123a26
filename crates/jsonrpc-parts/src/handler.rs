use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::{
    error::ToJsonRpcError,
    params::{ParamShape, Params},
    types::{JsonRpcVersion, RequestId},
};

/// Per-call information handed to handlers next to the params
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Name the method was invoked under
    pub method: String,
    /// `None` for notifications
    pub request_id: Option<RequestId>,
    pub version: JsonRpcVersion,
    /// Transport supplied extras (peer address, headers, ...)
    pub metadata: HashMap<String, Value>,
}

impl CallContext {
    pub fn new(method: impl Into<String>, request_id: Option<RequestId>, version: JsonRpcVersion) -> Self {
        Self {
            method: method.into(),
            request_id,
            version,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_notification(&self) -> bool {
        self.request_id.is_none()
    }

    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

/// Trait for handling JSON-RPC method calls
#[async_trait]
pub trait JsonRpcHandler: Send + Sync {
    /// The error type returned by this handler
    type Error: ToJsonRpcError;

    /// Handle one call. Returns domain errors only; the dispatcher turns
    /// them into protocol errors.
    async fn handle(&self, params: Params, context: CallContext) -> Result<Value, Self::Error>;

    /// Parameter contract checked before `handle` runs
    fn param_shape(&self) -> Option<ParamShape> {
        None
    }
}

/// A handler backed by a closure returning a boxed future
pub struct FunctionHandler<F, E> {
    handler_fn: F,
    shape: Option<ParamShape>,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> FunctionHandler<F, E>
where
    E: ToJsonRpcError,
    F: Fn(Params, CallContext) -> BoxFuture<'static, Result<Value, E>> + Send + Sync,
{
    pub fn new(handler_fn: F) -> Self {
        Self {
            handler_fn,
            shape: None,
            _error: PhantomData,
        }
    }

    pub fn with_shape(mut self, shape: ParamShape) -> Self {
        self.shape = Some(shape);
        self
    }
}

#[async_trait]
impl<F, E> JsonRpcHandler for FunctionHandler<F, E>
where
    E: ToJsonRpcError,
    F: Fn(Params, CallContext) -> BoxFuture<'static, Result<Value, E>> + Send + Sync,
{
    type Error = E;

    async fn handle(&self, params: Params, context: CallContext) -> Result<Value, Self::Error> {
        (self.handler_fn)(params, context).await
    }

    fn param_shape(&self) -> Option<ParamShape> {
        self.shape.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JsonRpcProcessingError;
    use crate::params::ParamKind;
    use crate::request::RequestParams;
    use futures::FutureExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_function_handler() {
        let handler = FunctionHandler::new(|params: Params, _ctx: CallContext| {
            async move {
                let values: Vec<i64> = params.parse()?;
                Ok::<_, JsonRpcProcessingError>(json!(values.iter().sum::<i64>()))
            }
            .boxed()
        })
        .with_shape(ParamShape::new().variadic());

        let params = Params::new(RequestParams::from_value(json!([1, 2, 3])));
        let ctx = CallContext::new("sum", Some(RequestId::from(1i64)), JsonRpcVersion::V2_0);

        assert_eq!(handler.handle(params, ctx).await.unwrap(), json!(6));
        assert!(handler.param_shape().is_some());
    }

    #[test]
    fn test_call_context() {
        let ctx = CallContext::new("log", None, JsonRpcVersion::V1_0).with_metadata(HashMap::from([(
            "peer".to_string(),
            json!("127.0.0.1:9000"),
        )]));
        assert!(ctx.is_notification());
        assert_eq!(ctx.metadata("peer"), Some(&json!("127.0.0.1:9000")));
        assert_eq!(ctx.metadata("missing"), None);
    }

    struct Echo;

    #[async_trait]
    impl JsonRpcHandler for Echo {
        type Error = JsonRpcProcessingError;

        async fn handle(&self, params: Params, _ctx: CallContext) -> Result<Value, Self::Error> {
            Ok(params.get("text").cloned().unwrap_or(Value::Null))
        }

        fn param_shape(&self) -> Option<ParamShape> {
            Some(ParamShape::new().required("text", ParamKind::String))
        }
    }

    #[tokio::test]
    async fn test_trait_handler() {
        let params = Params::new(RequestParams::from_value(json!({"text": "hi"})));
        let ctx = CallContext::new("echo", Some(RequestId::from("a")), JsonRpcVersion::V2_0);
        assert_eq!(Echo.handle(params, ctx).await.unwrap(), json!("hi"));
    }
}
