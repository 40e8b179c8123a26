//! HTTP JSON-RPC server implementation

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use jsonrpc_parts::{
    CallContext, DispatcherConfig, JsonRpcDispatcher, JsonRpcHandler, JsonRpcProcessingError,
    ParamShape, Params, ToJsonRpcError,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::{Result, handler::RpcHttpHandler};

/// Configuration for the HTTP JSON-RPC server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path the JSON-RPC endpoint is served on
    pub rpc_path: String,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size
    pub max_body_size: usize,
    /// Reject bodies not sent as `application/json`
    pub require_json_content_type: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            rpc_path: "/rpc".to_string(),
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
            require_json_content_type: true,
        }
    }
}

/// Builder for the HTTP JSON-RPC server
pub struct HttpRpcServerBuilder<E = JsonRpcProcessingError>
where
    E: ToJsonRpcError,
{
    config: ServerConfig,
    dispatcher: JsonRpcDispatcher<E>,
}

impl<E> HttpRpcServerBuilder<E>
where
    E: ToJsonRpcError,
{
    pub fn new() -> Self {
        Self::with_dispatcher(JsonRpcDispatcher::new())
    }

    /// Serve an already populated dispatcher
    pub fn with_dispatcher(dispatcher: JsonRpcDispatcher<E>) -> Self {
        Self {
            config: ServerConfig::default(),
            dispatcher,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    pub fn rpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.rpc_path = path.into();
        self
    }

    pub fn cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    pub fn require_json_content_type(mut self, require: bool) -> Self {
        self.config.require_json_content_type = require;
        self
    }

    pub fn dispatcher_config(mut self, config: DispatcherConfig) -> Self {
        self.dispatcher = self.dispatcher.with_config(config);
        self
    }

    pub fn register_handler<H, I, S>(mut self, methods: I, handler: H) -> Self
    where
        H: JsonRpcHandler<Error = E> + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dispatcher.register_methods(methods, handler);
        self
    }

    pub fn register_handler_with_shape<H>(
        mut self,
        method: impl Into<String>,
        handler: H,
        shape: ParamShape,
    ) -> Self
    where
        H: JsonRpcHandler<Error = E> + 'static,
    {
        self.dispatcher
            .register_method_with_shape(method, handler, shape);
        self
    }

    pub fn register_fn<F, Fut>(mut self, method: impl Into<String>, f: F) -> Self
    where
        F: Fn(Params, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, E>> + Send + 'static,
    {
        self.dispatcher.register_fn(method, f);
        self
    }

    pub fn build(self) -> HttpRpcServer<E> {
        let config = Arc::new(self.config);
        let handler = RpcHttpHandler::new(Arc::clone(&config), Arc::new(self.dispatcher));
        HttpRpcServer { config, handler }
    }
}

impl<E> Default for HttpRpcServerBuilder<E>
where
    E: ToJsonRpcError,
{
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP/1.1 JSON-RPC server
pub struct HttpRpcServer<E = JsonRpcProcessingError>
where
    E: ToJsonRpcError,
{
    config: Arc<ServerConfig>,
    handler: RpcHttpHandler<E>,
}

impl<E> Clone for HttpRpcServer<E>
where
    E: ToJsonRpcError,
{
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            handler: self.handler.clone(),
        }
    }
}

impl HttpRpcServer {
    pub fn builder() -> HttpRpcServerBuilder {
        HttpRpcServerBuilder::new()
    }
}

impl<E> HttpRpcServer<E>
where
    E: ToJsonRpcError,
{
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn handler(&self) -> &RpcHttpHandler<E> {
        &self.handler
    }

    /// Bind the configured address and serve until an accept error
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_address).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!("HTTP JSON-RPC server listening on {}", local_addr);
        info!("JSON-RPC endpoint available at: {}", self.config.rpc_path);

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    async move { Ok::<_, Infallible>(handler.handle(req, Some(peer_addr)).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    if err.is_incomplete_message() {
                        debug!("Client disconnected (normal): {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}
