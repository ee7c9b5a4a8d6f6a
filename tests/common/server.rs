//! Stub GraphQL server lifecycle management
//!
//! An axum app on a random local port, served from its own thread and runtime
//! so blocking tests can talk to it. Every request body is recorded and
//! answered by a test-supplied responder.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// One canned HTTP reply.
#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl StubReply {
    /// 200 with a `{"data": ...}` body.
    pub fn data(data: Value) -> Self {
        Self::json(200, serde_json::json!({ "data": data }))
    }

    /// 200 with a GraphQL error list and no data.
    pub fn errors(messages: &[&str]) -> Self {
        let errors: Vec<Value> = messages
            .iter()
            .map(|m| serde_json::json!({ "message": m }))
            .collect();
        Self::json(200, serde_json::json!({ "data": null, "errors": errors }))
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self::raw(status, body.to_string())
    }

    pub fn status(status: u16) -> Self {
        Self::raw(status, String::new())
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
        }
    }

    /// Hold the reply back for `delay` before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Responder = dyn Fn(&Value) -> StubReply + Send + Sync;

#[derive(Clone)]
struct StubState {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<Value>>>,
}

async fn graphql_handler(State(state): State<StubState>, body: Bytes) -> impl IntoResponse {
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(request.clone());

    let reply = (state.responder)(&request);
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
}

/// Stub GraphQL endpoint
///
/// When dropped, the server shuts down gracefully and the port is released.
pub struct StubGraphQlServer {
    /// Full endpoint URL (e.g., "http://127.0.0.1:12345/graphql")
    pub url: String,

    requests: Arc<Mutex<Vec<Value>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_thread: Option<JoinHandle<()>>,
}

impl StubGraphQlServer {
    /// Spawn a server answering each request through `responder`.
    pub fn spawn<F>(responder: F) -> Self
    where
        F: Fn(&Value) -> StubReply + Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("Failed to build stub server runtime");

        let listener = runtime
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .expect("Failed to bind stub server");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            responder: Arc::new(responder),
            requests: Arc::clone(&requests),
        };
        let app = Router::new()
            .route("/graphql", post(graphql_handler))
            .with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        // The listener is already bound, so requests queue up until serve starts
        let server_thread = thread::spawn(move || {
            runtime.block_on(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        shutdown_rx.await.ok();
                    })
                    .await
                    .expect("Stub server failed");
            });
        });

        Self {
            url: format!("http://127.0.0.1:{}/graphql", port),
            requests,
            shutdown_tx: Some(shutdown_tx),
            server_thread: Some(server_thread),
        }
    }

    /// Spawn a server replying from `replies` in order, repeating the last one.
    pub fn scripted(replies: Vec<StubReply>) -> Self {
        assert!(!replies.is_empty(), "scripted server needs at least one reply");
        let next = AtomicUsize::new(0);
        Self::spawn(move |_| {
            let index = next.fetch_add(1, Ordering::SeqCst).min(replies.len() - 1);
            replies[index].clone()
        })
    }

    /// Spawn a server giving the same reply to every request.
    pub fn always(reply: StubReply) -> Self {
        Self::spawn(move |_| reply.clone())
    }

    /// Request bodies received so far, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Drop for StubGraphQlServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_thread.take() {
            let _ = handle.join();
        }
    }
}
