//! Method name to handler table.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{JsonRpcProcessingError, ToJsonRpcError},
    handler::{CallContext, FunctionHandler, JsonRpcHandler},
    params::{ParamShape, Params},
};

/// A registered handler together with its parameter contract
pub struct MethodEntry<E> {
    pub handler: Arc<dyn JsonRpcHandler<Error = E>>,
    pub shape: Option<Arc<ParamShape>>,
}

impl<E> Clone for MethodEntry<E> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            shape: self.shape.clone(),
        }
    }
}

/// Registry of callable methods.
///
/// Registering a name that already exists replaces the earlier entry.
pub struct MethodRegistry<E = JsonRpcProcessingError>
where
    E: ToJsonRpcError,
{
    methods: HashMap<String, MethodEntry<E>>,
}

impl<E> MethodRegistry<E>
where
    E: ToJsonRpcError,
{
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Register a handler, using the contract it declares
    pub fn register<H>(&mut self, method: impl Into<String>, handler: H)
    where
        H: JsonRpcHandler<Error = E> + 'static,
    {
        let shape = handler.param_shape();
        self.insert(method.into(), Arc::new(handler), shape);
    }

    /// Register a handler with an explicit contract, overriding its own
    pub fn register_with_shape<H>(&mut self, method: impl Into<String>, handler: H, shape: ParamShape)
    where
        H: JsonRpcHandler<Error = E> + 'static,
    {
        self.insert(method.into(), Arc::new(handler), Some(shape));
    }

    /// Register one handler under several names
    pub fn register_methods<H, I, S>(&mut self, methods: I, handler: H)
    where
        H: JsonRpcHandler<Error = E> + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let shape = handler.param_shape();
        let handler: Arc<dyn JsonRpcHandler<Error = E>> = Arc::new(handler);
        for method in methods {
            self.insert(method.into(), handler.clone(), shape.clone());
        }
    }

    /// Register one handler under `prefix.name` for each name
    pub fn register_namespaced<H, I, S>(&mut self, prefix: &str, names: I, handler: H)
    where
        H: JsonRpcHandler<Error = E> + 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let qualified: Vec<String> = names
            .into_iter()
            .map(|name| format!("{}.{}", prefix, name.as_ref()))
            .collect();
        self.register_methods(qualified, handler);
    }

    /// Register an async closure
    pub fn register_fn<F, Fut>(&mut self, method: impl Into<String>, f: F)
    where
        F: Fn(Params, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
    {
        self.register(
            method,
            FunctionHandler::new(move |params: Params, ctx: CallContext| f(params, ctx).boxed()),
        );
    }

    /// Register a plain closure that does not need to await anything
    pub fn register_sync_fn<F>(&mut self, method: impl Into<String>, f: F)
    where
        F: Fn(Params) -> Result<Value, E> + Send + Sync + 'static,
    {
        self.register(
            method,
            FunctionHandler::new(move |params: Params, _ctx: CallContext| {
                futures::future::ready(f(params)).boxed()
            }),
        );
    }

    pub fn unregister(&mut self, method: &str) -> bool {
        self.methods.remove(method).is_some()
    }

    pub fn get(&self, method: &str) -> Option<&MethodEntry<E>> {
        self.methods.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Registered names, sorted
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn insert(
        &mut self,
        method: String,
        handler: Arc<dyn JsonRpcHandler<Error = E>>,
        shape: Option<ParamShape>,
    ) {
        debug!(method = %method, "registering method");
        self.methods.insert(
            method,
            MethodEntry {
                handler,
                shape: shape.map(Arc::new),
            },
        );
    }
}

impl<E> Default for MethodRegistry<E>
where
    E: ToJsonRpcError,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for MethodRegistry<E>
where
    E: ToJsonRpcError,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.method_names())
            .finish()
    }
}
