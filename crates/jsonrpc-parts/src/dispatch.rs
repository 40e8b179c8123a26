//! Routing parsed messages to registered handlers.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{
    error::{JsonRpcError, JsonRpcErrorObject, JsonRpcProcessingError, ToJsonRpcError},
    handler::{CallContext, JsonRpcHandler},
    mapper::{ErrorDetailPolicy, ErrorMapper},
    message::{BatchEntry, JsonRpcMessage, JsonRpcPayload},
    notification::JsonRpcNotification,
    params::{ParamShape, Params},
    parser,
    registry::MethodRegistry,
    request::{JsonRpcRequest, RequestParams},
    response::{JsonRpcMessageResult, JsonRpcReply, JsonRpcResponse},
    types::{JsonRpcVersion, RequestId},
};

/// Caller-supplied metadata forwarded into every [`CallContext`]
pub type Metadata = HashMap<String, Value>;

#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    pub error_detail: ErrorDetailPolicy,
    /// Run batch elements concurrently instead of one after another
    pub concurrent_batches: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            error_detail: ErrorDetailPolicy::Hide,
            concurrent_batches: true,
        }
    }
}

/// JSON-RPC method dispatcher with specific error type
pub struct JsonRpcDispatcher<E = JsonRpcProcessingError>
where
    E: ToJsonRpcError,
{
    registry: MethodRegistry<E>,
    mapper: ErrorMapper,
    config: DispatcherConfig,
}

impl<E> JsonRpcDispatcher<E>
where
    E: ToJsonRpcError,
{
    pub fn new() -> Self {
        Self::with_registry(MethodRegistry::new())
    }

    pub fn with_registry(registry: MethodRegistry<E>) -> Self {
        let config = DispatcherConfig::default();
        Self {
            registry,
            mapper: ErrorMapper::new(config.error_detail),
            config,
        }
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.mapper = ErrorMapper::new(config.error_detail);
        self.config = config;
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn registry(&self) -> &MethodRegistry<E> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MethodRegistry<E> {
        &mut self.registry
    }

    /// Register a handler for a specific method
    pub fn register_method<H>(&mut self, method: impl Into<String>, handler: H)
    where
        H: JsonRpcHandler<Error = E> + 'static,
    {
        self.registry.register(method, handler);
    }

    pub fn register_method_with_shape<H>(
        &mut self,
        method: impl Into<String>,
        handler: H,
        shape: ParamShape,
    ) where
        H: JsonRpcHandler<Error = E> + 'static,
    {
        self.registry.register_with_shape(method, handler, shape);
    }

    /// Register a handler for multiple methods
    pub fn register_methods<H, I, S>(&mut self, methods: I, handler: H)
    where
        H: JsonRpcHandler<Error = E> + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.register_methods(methods, handler);
    }

    pub fn register_fn<F, Fut>(&mut self, method: impl Into<String>, f: F)
    where
        F: Fn(Params, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
    {
        self.registry.register_fn(method, f);
    }

    /// Get all registered methods
    pub fn registered_methods(&self) -> Vec<String> {
        self.registry.method_names()
    }

    /// Process a JSON-RPC request and return a response
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcReply {
        self.handle_request_with_context(request, &Metadata::new())
            .await
    }

    pub async fn handle_request_with_context(
        &self,
        request: JsonRpcRequest,
        metadata: &Metadata,
    ) -> JsonRpcReply {
        let JsonRpcRequest {
            version,
            method,
            params,
            id,
        } = request;

        match self
            .invoke(&method, params, Some(id.clone()), version, metadata)
            .await
        {
            Ok(result) => JsonRpcResponse::with_version(version, id, result).into(),
            Err(error) => JsonRpcError::with_version(version, id, error).into(),
        }
    }

    /// Process a JSON-RPC notification. Failures are logged, never answered.
    pub async fn handle_notification(&self, notification: JsonRpcNotification) {
        self.handle_notification_with_context(notification, &Metadata::new())
            .await
    }

    pub async fn handle_notification_with_context(
        &self,
        notification: JsonRpcNotification,
        metadata: &Metadata,
    ) {
        let JsonRpcNotification {
            version,
            method,
            params,
        } = notification;

        if let Err(error) = self.invoke(&method, params, None, version, metadata).await {
            warn!(
                method = %method,
                code = error.code,
                message = %error.message,
                "notification failed"
            );
        }
    }

    /// Dispatch one parsed message; `None` for notifications
    pub async fn dispatch_message(
        &self,
        message: JsonRpcMessage,
        metadata: &Metadata,
    ) -> Option<JsonRpcReply> {
        match message {
            JsonRpcMessage::Request(request) => {
                Some(self.handle_request_with_context(request, metadata).await)
            }
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification_with_context(notification, metadata)
                    .await;
                None
            }
        }
    }

    /// Dispatch a parsed payload
    pub async fn dispatch(&self, payload: JsonRpcPayload) -> JsonRpcMessageResult {
        self.dispatch_with_context(payload, &Metadata::new()).await
    }

    pub async fn dispatch_with_context(
        &self,
        payload: JsonRpcPayload,
        metadata: &Metadata,
    ) -> JsonRpcMessageResult {
        match payload {
            JsonRpcPayload::Single(message) => match self.dispatch_message(message, metadata).await {
                Some(reply) => JsonRpcMessageResult::Single(reply),
                None => JsonRpcMessageResult::NoResponse,
            },
            JsonRpcPayload::Discarded(error) => {
                discard(&error);
                JsonRpcMessageResult::NoResponse
            }
            JsonRpcPayload::Batch(entries) => {
                let replies = self.dispatch_batch(entries, metadata).await;
                if replies.is_empty() {
                    JsonRpcMessageResult::NoResponse
                } else {
                    JsonRpcMessageResult::Batch(replies)
                }
            }
        }
    }

    /// Validate and dispatch an already decoded value
    pub async fn handle_value(&self, value: Value) -> JsonRpcMessageResult {
        self.handle_value_with_context(value, &Metadata::new())
            .await
    }

    pub async fn handle_value_with_context(
        &self,
        value: Value,
        metadata: &Metadata,
    ) -> JsonRpcMessageResult {
        match parser::parse_payload(value) {
            Ok(payload) => self.dispatch_with_context(payload, metadata).await,
            Err(error) => JsonRpcMessageResult::Single(error.into()),
        }
    }

    pub async fn handle_str(&self, text: &str) -> JsonRpcMessageResult {
        self.handle_slice(text.as_bytes()).await
    }

    pub async fn handle_slice(&self, bytes: &[u8]) -> JsonRpcMessageResult {
        self.handle_slice_with_context(bytes, &Metadata::new())
            .await
    }

    /// Decode, validate and dispatch raw bytes from a transport
    pub async fn handle_slice_with_context(
        &self,
        bytes: &[u8],
        metadata: &Metadata,
    ) -> JsonRpcMessageResult {
        match parser::parse_payload_slice(bytes) {
            Ok(payload) => self.dispatch_with_context(payload, metadata).await,
            Err(error) => JsonRpcMessageResult::Single(error.into()),
        }
    }

    /// Text in, text out; `None` when nothing is to be sent back
    pub async fn handle_request_string(&self, text: &str) -> Option<String> {
        let result = self.handle_str(text).await;
        match result.to_json_string() {
            Ok(encoded) => encoded,
            Err(err) => {
                error!(error = %err, "failed to encode response");
                let fallback = JsonRpcMessageResult::Single(
                    JsonRpcError::internal_error(RequestId::Null, None).into(),
                );
                fallback.to_json_string().ok().flatten()
            }
        }
    }

    async fn dispatch_batch(&self, entries: Vec<BatchEntry>, metadata: &Metadata) -> Vec<JsonRpcReply> {
        debug!(size = entries.len(), "dispatching batch");

        let mut slots: Vec<Option<JsonRpcReply>> = Vec::with_capacity(entries.len());
        let mut pending = Vec::new();
        for (index, entry) in entries.into_iter().enumerate() {
            match entry {
                BatchEntry::Message(message) => {
                    slots.push(None);
                    pending.push((index, message));
                }
                BatchEntry::Invalid(error) => slots.push(Some(error.into())),
                BatchEntry::Discarded(error) => {
                    discard(&error);
                    slots.push(None);
                }
            }
        }

        if self.config.concurrent_batches {
            let mut running: FuturesUnordered<_> = pending
                .into_iter()
                .map(|(index, message)| async move {
                    (index, self.dispatch_message(message, metadata).await)
                })
                .collect();
            while let Some((index, reply)) = running.next().await {
                slots[index] = reply;
            }
        } else {
            for (index, message) in pending {
                slots[index] = self.dispatch_message(message, metadata).await;
            }
        }

        slots.into_iter().flatten().collect()
    }

    /// The single invocation boundary: lookup, contract check, call, and
    /// classification of whatever the handler did.
    async fn invoke(
        &self,
        method: &str,
        params: Option<RequestParams>,
        request_id: Option<RequestId>,
        version: JsonRpcVersion,
        metadata: &Metadata,
    ) -> Result<Value, JsonRpcErrorObject> {
        let Some(entry) = self.registry.get(method) else {
            debug!(method, "method not found");
            return Err(JsonRpcErrorObject::method_not_found());
        };

        if let Some(shape) = &entry.shape {
            if let Err(detail) = shape.validate(params.as_ref()) {
                debug!(method, detail = %detail, "params rejected");
                return Err(JsonRpcErrorObject::invalid_params(detail));
            }
        }

        let params = Params::with_shape(params, entry.shape.clone());
        let context = CallContext::new(method, request_id, version).with_metadata(metadata.clone());

        debug!(method, "invoking handler");
        match AssertUnwindSafe(entry.handler.handle(params, context))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => Err(self.mapper.map(method, &err)),
            Err(panic) => Err(self.mapper.map_panic(method, panic.as_ref())),
        }
    }
}

fn discard(error: &JsonRpcError) {
    warn!(
        code = error.error.code,
        message = %error.error.message,
        "dropping malformed notification"
    );
}

impl<E> Default for JsonRpcDispatcher<E>
where
    E: ToJsonRpcError,
{
    fn default() -> Self {
        Self::new()
    }
}
