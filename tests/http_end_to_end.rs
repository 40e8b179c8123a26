//! End-to-end tests for the HTTP binding
//!
//! Each test starts a real server on a free port and talks to it through
//! `HttpRpcClient` or plain reqwest.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use jsonrpc_parts::prelude::*;
use jsonrpc_parts_http::{HttpClientError, HttpRpcClient, HttpRpcServer};
use serde_json::{Value, json};
use serial_test::serial;
use tokio::time::sleep;

struct TestServer {
    url: String,
    notifications: Arc<AtomicUsize>,
}

async fn start_test_server() -> TestServer {
    let port = portpicker::pick_unused_port().expect("No available port");
    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notifications);

    let server = HttpRpcServer::builder()
        .bind_address(([127, 0, 0, 1], port).into())
        .register_fn("add", |params: Params, _ctx: CallContext| async move {
            let (a, b): (i64, i64) = params.parse()?;
            Ok::<_, JsonRpcProcessingError>(json!(a + b))
        })
        .register_fn("tick", move |_params: Params, _ctx: CallContext| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, JsonRpcProcessingError>(Value::Null)
            }
        })
        .register_fn("deny", |_params: Params, _ctx: CallContext| async {
            Err::<Value, _>(JsonRpcProcessingError::Rpc(
                JsonRpcErrorObject::permission_denied(None),
            ))
        })
        .register_fn("user_agent", |_params: Params, ctx: CallContext| async move {
            Ok::<_, JsonRpcProcessingError>(ctx.metadata("user_agent").cloned().unwrap_or(Value::Null))
        })
        .build();

    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            eprintln!("Server error: {}", e);
        }
    });

    // Wait for server to start
    sleep(Duration::from_millis(200)).await;

    TestServer {
        url: format!("http://127.0.0.1:{}/rpc", port),
        notifications,
    }
}

#[tokio::test]
#[serial]
async fn test_call_roundtrip() {
    let server = start_test_server().await;
    let client = HttpRpcClient::new(&server.url).unwrap();

    let result = client
        .call("add", RequestParams::from_value(json!([19, 23])))
        .await
        .unwrap();
    assert_eq!(result, json!(42));

    let agent = client.call("user_agent", None).await.unwrap();
    assert!(agent.as_str().unwrap().starts_with("jsonrpc-parts-http/"));
}

#[tokio::test]
#[serial]
async fn test_declared_error_reaches_client() {
    let server = start_test_server().await;
    let client = HttpRpcClient::new(&server.url).unwrap();

    match client.call("deny", None).await {
        Err(HttpClientError::Rpc(error)) => {
            assert_eq!(error.code, -32002);
            assert_eq!(error.message, "Permission denied");
        }
        other => panic!("expected an RPC error, got {:?}", other),
    }

    match client.call("missing", None).await {
        Err(HttpClientError::Rpc(error)) => assert_eq!(error.code, -32601),
        other => panic!("expected method not found, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn test_notification_runs_without_reply() {
    let server = start_test_server().await;
    let client = HttpRpcClient::new(&server.url).unwrap();

    client.notify("tick", None).await.unwrap();
    client.notify("tick", None).await.unwrap();
    assert_eq!(server.notifications.load(Ordering::SeqCst), 2);

    let response = reqwest::Client::new()
        .post(&server.url)
        .json(&json!({"jsonrpc": "2.0", "method": "tick"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_batch_over_http() {
    let server = start_test_server().await;
    let client = HttpRpcClient::new(&server.url).unwrap();

    let mut builder = client.request_builder();
    builder.begin_batch().unwrap();
    let first = builder
        .call("add", RequestParams::from_value(json!([1, 2])))
        .unwrap();
    builder.notify("tick", None).unwrap();
    let second = builder.call("missing", None).unwrap();

    let entries = client.batch(builder.finish_batch()).await.unwrap();
    assert_eq!(entries.len(), 2);

    let ok = entries[0].as_ref().unwrap();
    assert_eq!(ok.id, first.id);
    assert_eq!(ok.outcome, Ok(json!(3)));

    let failed = entries[1].as_ref().unwrap();
    assert_eq!(failed.id, second.id);
    assert_eq!(failed.outcome.as_ref().unwrap_err().code, -32601);
    assert_eq!(server.notifications.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[serial]
async fn test_raw_wire_format() {
    let server = start_test_server().await;
    let http = reqwest::Client::new();

    let response = http
        .post(&server.url)
        .header("Content-Type", "application/json")
        .body(r#"{"jsonrpc":"2.0","method":"add","params":[2,3],"id":1}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.text().await.unwrap(),
        r#"{"jsonrpc":"2.0","result":5,"id":1}"#
    );

    let response = http
        .post(&server.url)
        .header("Content-Type", "application/json")
        .body(r#"{"method":"add","params":[2,3],"id":"legacy"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), r#"{"result":5,"id":"legacy"}"#);

    let response = http
        .post(&server.url)
        .header("Content-Type", "application/json")
        .body("[1,2")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
#[serial]
async fn test_http_status_codes() {
    let server = start_test_server().await;
    let http = reqwest::Client::new();

    let response = http.get(&server.url).send().await.unwrap();
    assert_eq!(response.status(), 405);
    assert_eq!(response.headers()["allow"], "POST, OPTIONS");

    let wrong_path = server.url.replace("/rpc", "/other");
    let response = http
        .post(&wrong_path)
        .json(&json!({"jsonrpc": "2.0", "method": "add", "params": [1, 1], "id": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = http
        .post(&server.url)
        .header("Content-Type", "text/plain")
        .body(r#"{"jsonrpc":"2.0","method":"add","params":[1,1],"id":1}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 415);

    let response = http
        .request(reqwest::Method::OPTIONS, &server.url)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
