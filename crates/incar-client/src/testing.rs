//! Test utilities for incar-client
//!
//! Provides mock in-car services and a small server harness for running
//! integration tests against them.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::{Result, VIN_HEADER};

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve an axum Router on an ephemeral local port.
    pub async fn start(router: Router) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give the server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal if not already done
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        // Abort the task if still running
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// One request captured by a mock service.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string.
    pub path: String,
    /// Value of the VIN header, when the request carried one.
    pub vin_header: Option<String>,
    pub body: String,
}

/// Shared log of the requests a mock service has received.
#[derive(Debug, Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<RecordedRequest>>>);

impl RequestLog {
    fn record(&self, request: RecordedRequest) {
        if let Ok(mut log) = self.0.lock() {
            log.push(request);
        }
    }

    /// Snapshot of the recorded requests, in arrival order.
    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.0.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

// =============================================================================
// Mock debug service
// =============================================================================

#[derive(Clone)]
struct DebugServiceState {
    values: Arc<HashMap<String, Value>>,
    log: RequestLog,
}

#[derive(Deserialize)]
struct ValueQuery {
    #[serde(rename = "valueName")]
    value_name: String,
}

async fn get_data_value(
    State(state): State<DebugServiceState>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<ValueQuery>,
) -> Response {
    state.log.record(RecordedRequest {
        method: "GET".to_string(),
        path: path_and_query(&uri),
        vin_header: header_value(&headers, VIN_HEADER),
        body: String::new(),
    });

    match state.values.get(&query.value_name) {
        Some(value) => Json(json!({ "value": value })).into_response(),
        // Unknown variables still answer 200, just without a `value` field.
        None => Json(json!({ "error": "unknown value" })).into_response(),
    }
}

/// Mock debug service answering `/get_data_value` lookups from a fixed
/// value table. Returns the router and the log of received requests.
pub fn debug_service_router(values: HashMap<String, Value>) -> (Router, RequestLog) {
    let log = RequestLog::default();
    let state = DebugServiceState {
        values: Arc::new(values),
        log: log.clone(),
    };
    let router = Router::new()
        .route("/get_data_value", get(get_data_value))
        .with_state(state);
    (router, log)
}

// =============================================================================
// Mock remote API
// =============================================================================

#[derive(Clone)]
struct RemoteApiState {
    responses: Arc<HashMap<String, Value>>,
    log: RequestLog,
}

async fn remote_api_handler(
    State(state): State<RemoteApiState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = path_and_query(&uri);
    state.log.record(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        vin_header: header_value(&headers, VIN_HEADER),
        body,
    });

    match state.responses.get(&path) {
        Some(value) => Json(value.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown command" })),
        )
            .into_response(),
    }
}

/// Mock remote API answering from a path table (keys include the query
/// string) and recording every request it receives.
pub fn remote_api_router(responses: HashMap<String, Value>) -> (Router, RequestLog) {
    let log = RequestLog::default();
    let state = RemoteApiState {
        responses: Arc::new(responses),
        log: log.clone(),
    };
    let router = Router::new().fallback(remote_api_handler).with_state(state);
    (router, log)
}

fn path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_lifecycle() {
        let (router, log) = debug_service_router(HashMap::new());
        let server = TestServer::start(router).await.unwrap();
        assert!(server.base_url().starts_with("http://127.0.0.1:"));
        assert!(log.recorded().is_empty());
        server.shutdown().await;
    }
}
