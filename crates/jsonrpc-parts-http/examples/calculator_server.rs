//! Calculator over HTTP
//!
//! ```text
//! cargo run -p jsonrpc-parts-http --example calculator_server -- --bind 127.0.0.1:8000
//! curl -s -X POST http://127.0.0.1:8000/rpc -H 'Content-Type: application/json' \
//!      -d '{"jsonrpc":"2.0","method":"calc.add","params":{"a":2,"b":3},"id":1}'
//! ```

use std::net::SocketAddr;

use async_trait::async_trait;
use clap::Parser;
use jsonrpc_parts::prelude::*;
use jsonrpc_parts_http::HttpRpcServer;
use serde_json::{Value, json};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Path of the JSON-RPC endpoint
    #[arg(short, long, default_value = "/rpc")]
    path: String,

    /// Put internal failure details into error responses
    #[arg(long, default_value = "false")]
    expose_errors: bool,
}

struct Arithmetic;

#[async_trait]
impl JsonRpcHandler for Arithmetic {
    type Error = JsonRpcProcessingError;

    async fn handle(&self, params: Params, context: CallContext) -> Result<Value, Self::Error> {
        let a: f64 = params.required("a")?;
        let b: f64 = params.required("b")?;
        let result = match context.method.as_str() {
            "calc.add" => a + b,
            "calc.subtract" => a - b,
            "calc.multiply" => a * b,
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
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let error_detail = if args.expose_errors {
        ErrorDetailPolicy::Expose
    } else {
        ErrorDetailPolicy::Hide
    };

    let server = HttpRpcServer::builder()
        .bind_address(args.bind)
        .rpc_path(args.path)
        .dispatcher_config(DispatcherConfig {
            error_detail,
            ..DispatcherConfig::default()
        })
        .register_handler(
            ["calc.add", "calc.subtract", "calc.multiply", "calc.divide"],
            Arithmetic,
        )
        .register_fn("echo", |params, _ctx| async move {
            Ok::<_, JsonRpcProcessingError>(params.raw().map_or(Value::Null, RequestParams::to_value))
        })
        .register_fn("peer", |_params, ctx| async move {
            Ok::<_, JsonRpcProcessingError>(ctx.metadata("peer").cloned().unwrap_or(Value::Null))
        })
        .build();

    info!(expose_errors = args.expose_errors, "starting calculator server");
    server.run().await?;
    Ok(())
}
