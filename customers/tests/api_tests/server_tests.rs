use std::sync::Arc;
use std::time::Duration;

use customers::{
    executable_utils::{AppState, serve},
    lifecycle::ShutdownHandle,
};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::net::TcpListener;

use super::mocks::storage_returning;
use crate::test_utils::sample_customer_json;

#[tokio::test]
async fn test_server_stops_accepting_after_shutdown_route() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let state = AppState::new(Arc::new(storage_returning(1)), ShutdownHandle::new());
    let server = tokio::spawn(async move {
        serve(listener, state, None).await.map_err(|e| e.to_string())
    });

    // No idle keep-alive connections, so graceful shutdown is not held open.
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap();

    let created = client
        .post(format!("{base}/customers"))
        .json(&sample_customer_json(99, "Eve"))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = created.json().await.unwrap();
    assert_eq!(body["Id"], 1);

    let stopped = client.get(format!("{base}/shutdown")).send().await.unwrap();
    assert_eq!(stopped.status(), StatusCode::OK);

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop after /shutdown")
        .unwrap();
    assert_eq!(result, Ok(()));

    assert!(client.get(format!("{base}/")).send().await.is_err());
}

#[tokio::test]
async fn test_bad_request_over_the_wire() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let shutdown = ShutdownHandle::new();
    let state = AppState::new(Arc::new(storage_returning(1)), shutdown.clone());
    let server = tokio::spawn(async move {
        serve(listener, state, None).await.map_err(|e| e.to_string())
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap();
    let response = client
        .post(format!("{base}/customers"))
        .header("Content-Type", "application/json")
        .body("{\"Id\": ")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop after trigger")
        .unwrap()
        .unwrap();
}
