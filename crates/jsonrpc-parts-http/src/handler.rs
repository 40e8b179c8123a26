//! HTTP request handler for JSON-RPC payloads

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE, HeaderValue, USER_AGENT};
use hyper::{Method, Request, Response, StatusCode};
use jsonrpc_parts::{JsonRpcDispatcher, Metadata, ToJsonRpcError, serializer};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{cors::CorsLayer, server::ServerConfig};

/// Turns HTTP requests into dispatcher calls and dispatcher results into
/// HTTP responses
pub struct RpcHttpHandler<E>
where
    E: ToJsonRpcError,
{
    config: Arc<ServerConfig>,
    dispatcher: Arc<JsonRpcDispatcher<E>>,
}

impl<E> Clone for RpcHttpHandler<E>
where
    E: ToJsonRpcError,
{
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<E> RpcHttpHandler<E>
where
    E: ToJsonRpcError,
{
    pub fn new(config: Arc<ServerConfig>, dispatcher: Arc<JsonRpcDispatcher<E>>) -> Self {
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Handle one HTTP request. Never fails: every problem becomes a status
    /// code.
    pub async fn handle<B>(&self, req: Request<B>, peer: Option<SocketAddr>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        debug!(method = %req.method(), path = req.uri().path(), "handling request");

        let mut response = if req.uri().path() != self.config.rpc_path {
            plain(StatusCode::NOT_FOUND, "Not Found")
        } else {
            let method = req.method().clone();
            match method {
                Method::POST => self.handle_post(req, peer).await,
                Method::OPTIONS if self.config.enable_cors => empty(StatusCode::NO_CONTENT),
                _ => method_not_allowed(self.config.enable_cors),
            }
        };

        if self.config.enable_cors {
            CorsLayer::apply_cors_headers(response.headers_mut());
        }
        response
    }

    async fn handle_post<B>(&self, req: Request<B>, peer: Option<SocketAddr>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if self.config.require_json_content_type && !is_json(&req) {
            warn!(content_type = ?req.headers().get(CONTENT_TYPE), "rejecting non-JSON body");
            return plain(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Content-Type must be application/json",
            );
        }

        let declared_length = req
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<usize>().ok());
        if declared_length.is_some_and(|length| length > self.config.max_body_size) {
            warn!(length = ?declared_length, "request body too large");
            return plain(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }

        let metadata = request_metadata(&req, peer);

        let body = match Limited::new(req.into_body(), self.config.max_body_size)
            .collect()
            .await
        {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                warn!("request body too large");
                return plain(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
            }
            Err(err) => {
                error!(error = %err, "failed to read request body");
                return plain(StatusCode::BAD_REQUEST, "Failed to read request body");
            }
        };

        debug!(size = body.len(), "dispatching body");
        let result = self
            .dispatcher
            .handle_slice_with_context(&body, &metadata)
            .await;

        match serializer::to_vec(&result) {
            Ok(Some(encoded)) => json(encoded),
            Ok(None) => empty(StatusCode::NO_CONTENT),
            Err(err) => {
                error!(error = %err, "failed to encode response");
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

fn is_json<B>(req: &Request<B>) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().starts_with("application/json"))
}

fn request_metadata<B>(req: &Request<B>, peer: Option<SocketAddr>) -> Metadata {
    let mut metadata = Metadata::new();
    if let Some(peer) = peer {
        metadata.insert("peer".to_string(), Value::String(peer.to_string()));
    }
    if let Some(agent) = req.headers().get(USER_AGENT).and_then(|v| v.to_str().ok()) {
        metadata.insert("user_agent".to_string(), Value::String(agent.to_string()));
    }
    metadata
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn plain(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(text.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

fn json(body: Vec<u8>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn method_not_allowed(with_options: bool) -> Response<Full<Bytes>> {
    let mut response = plain(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    let allow = if with_options { "POST, OPTIONS" } else { "POST" };
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}
