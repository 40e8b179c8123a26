//! HTTP JSON-RPC client

use std::time::Duration;

use jsonrpc_parts::{
    BuildError, JsonRpcErrorObject, JsonRpcMessage, JsonRpcVersion, ParsedResponse,
    RequestBuilder, RequestId, RequestParams, ResponseParseError, ResponsePayload,
    parse_response,
};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(StatusCode),

    #[error("Invalid call: {0}")]
    Build(#[from] BuildError),

    #[error("Invalid response: {0}")]
    Response(#[from] ResponseParseError),

    /// The server answered with a protocol error
    #[error("JSON-RPC error: {0}")]
    Rpc(JsonRpcErrorObject),

    #[error("Response id {got} does not match request id {expected}")]
    IdMismatch { expected: RequestId, got: RequestId },

    #[error("Server sent no response body")]
    EmptyResponse,

    #[error("Server answered a single call with a batch")]
    UnexpectedBatch,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Protocol version calls are sent with
    pub version: JsonRpcVersion,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("jsonrpc-parts-http/{}", env!("CARGO_PKG_VERSION")),
            version: JsonRpcVersion::V2_0,
        }
    }
}

/// JSON-RPC client over HTTP POST
#[derive(Debug, Clone)]
pub struct HttpRpcClient {
    url: String,
    config: ClientConfig,
    http: reqwest::Client,
}

impl HttpRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, HttpClientError> {
        Self::with_config(url, ClientConfig::default())
    }

    pub fn with_config(url: impl Into<String>, config: ClientConfig) -> Result<Self, HttpClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            url: url.into(),
            config,
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Builder matching the configured protocol version
    pub fn request_builder(&self) -> RequestBuilder {
        match self.config.version {
            JsonRpcVersion::V1_0 => RequestBuilder::v1(),
            JsonRpcVersion::V2_0 => RequestBuilder::new(),
        }
    }

    /// Call a method and wait for its result
    pub async fn call(&self, method: &str, params: Option<RequestParams>) -> Result<Value, HttpClientError> {
        let request = self.request_builder().call(method, params)?;
        debug!(method, id = %request.id, "sending call");

        let Some(body) = self.post(&JsonRpcMessage::from(request.clone())).await? else {
            return Err(HttpClientError::EmptyResponse);
        };
        let response = match parse_response(body)? {
            ResponsePayload::Single(response) => response,
            ResponsePayload::Batch(_) => return Err(HttpClientError::UnexpectedBatch),
        };

        // Parse errors are answered with a null id
        if response.id != request.id && !(response.is_error() && response.id.is_null()) {
            return Err(HttpClientError::IdMismatch {
                expected: request.id,
                got: response.id,
            });
        }
        response.into_result().map_err(HttpClientError::Rpc)
    }

    /// Send a notification; the server is not expected to answer
    pub async fn notify(&self, method: &str, params: Option<RequestParams>) -> Result<(), HttpClientError> {
        let notification = self.request_builder().notify(method, params)?;
        debug!(method, "sending notification");

        match self.post(&notification.into()).await? {
            None => Ok(()),
            // Rejected before it was recognised as a notification
            Some(body) => match parse_response(body)? {
                ResponsePayload::Single(response) => response.into_result().map(drop).map_err(HttpClientError::Rpc),
                ResponsePayload::Batch(_) => Err(HttpClientError::UnexpectedBatch),
            },
        }
    }

    /// Send a batch assembled with [`RequestBuilder::begin_batch`]. Entries
    /// come back in server order; notifications have none.
    pub async fn batch(
        &self,
        messages: Vec<JsonRpcMessage>,
    ) -> Result<Vec<Result<ParsedResponse, ResponseParseError>>, HttpClientError> {
        debug!(size = messages.len(), "sending batch");
        let body = self
            .http
            .post(&self.url)
            .json(&messages)
            .send()
            .await?;
        match read_body(body).await? {
            None => Ok(Vec::new()),
            Some(value) => match parse_response(value)? {
                ResponsePayload::Batch(entries) => Ok(entries),
                // The server rejected the batch as a whole
                ResponsePayload::Single(response) => Ok(vec![Ok(response)]),
            },
        }
    }

    async fn post(&self, message: &JsonRpcMessage) -> Result<Option<Value>, HttpClientError> {
        let response = self
            .http
            .post(&self.url)
            .json(message)
            .send()
            .await?;
        read_body(response).await
    }
}

async fn read_body(response: reqwest::Response) -> Result<Option<Value>, HttpClientError> {
    match response.status() {
        StatusCode::NO_CONTENT => Ok(None),
        StatusCode::OK => Ok(Some(response.json().await?)),
        status => Err(HttpClientError::Status(status)),
    }
}
