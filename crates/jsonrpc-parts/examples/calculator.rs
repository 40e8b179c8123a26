//! Simple Calculator JSON-RPC Example
//!
//! Runs a handful of 1.0 and 2.0 payloads (single calls, a batch, a
//! notification and some broken input) through a dispatcher with a calculator
//! handler registered under several names.

use async_trait::async_trait;
use jsonrpc_parts::prelude::*;
use serde_json::{Value, json};
use tracing::info;

/// Calculator handler that implements basic arithmetic operations
struct CalculatorHandler;

#[async_trait]
impl JsonRpcHandler for CalculatorHandler {
    type Error = JsonRpcProcessingError;

    async fn handle(&self, params: Params, context: CallContext) -> Result<Value, Self::Error> {
        let a: f64 = params.required("a")?;
        let b: f64 = params.required("b")?;

        let result = match context.method.as_str() {
            "calc.add" => a + b,
            "calc.subtract" => a - b,
            "calc.divide" if b == 0.0 => {
                return Err(JsonRpcErrorObject::invalid_param_values(Some(json!("division by zero"))).into());
            }
            "calc.divide" => a / b,
            other => {
                return Err(JsonRpcProcessingError::HandlerError(format!(
                    "no operation behind {}",
                    other
                )));
            }
        };
        info!(method = %context.method, a, b, result, "calculated");
        Ok(json!(result))
    }

    fn param_shape(&self) -> Option<ParamShape> {
        Some(
            ParamShape::new()
                .required("a", ParamKind::Number)
                .required("b", ParamKind::Number),
        )
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut dispatcher: JsonRpcDispatcher = JsonRpcDispatcher::new();
    dispatcher
        .registry_mut()
        .register_namespaced("calc", ["add", "subtract", "divide"], CalculatorHandler);
    dispatcher.registry_mut().register_sync_fn("echo", |params| {
        Ok(params.raw().map_or(Value::Null, RequestParams::to_value))
    });

    info!(methods = ?dispatcher.registered_methods(), "dispatcher ready");

    let payloads = [
        r#"{"jsonrpc": "2.0", "method": "calc.add", "params": {"a": 5, "b": 3}, "id": 1}"#,
        r#"{"jsonrpc": "2.0", "method": "calc.subtract", "params": [10, 4], "id": 2}"#,
        r#"{"jsonrpc": "2.0", "method": "calc.divide", "params": [1, 0], "id": 3}"#,
        r#"{"jsonrpc": "2.0", "method": "calc.multiply", "params": [2, 3], "id": 4}"#,
        r#"{"jsonrpc": "2.0", "method": "calc.add", "params": {"a": "invalid", "b": 5}, "id": 5}"#,
        r#"{"method": "echo", "params": ["legacy", 1], "id": 6}"#,
        r#"{"jsonrpc": "2.0", "method": "echo", "params": ["fire and forget"]}"#,
        r#"[{"jsonrpc": "2.0", "method": "calc.add", "params": [1, 1], "id": 7}, {"jsonrpc": "2.0", "method": "echo"}, 42]"#,
        r#"{"jsonrpc": "2.0", "method""#,
    ];

    for payload in payloads {
        println!("--> {}", payload);
        match dispatcher.handle_request_string(payload).await {
            Some(response) => println!("<-- {}", response),
            None => println!("<-- (no response)"),
        }
    }
}
