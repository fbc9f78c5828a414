use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use platformops_client::config::ClientConfig;
use platformops_client::storage::{KeyValueStore, MemoryStore};
use platformops_client::AppContext;

/// One request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
struct MockState {
    routes: Arc<Mutex<HashMap<String, (u16, Value)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// In-process stand-in for the PlatformOPS backend.
///
/// Responses are registered per `"METHOD /path"`; anything unregistered
/// answers 404. Every request is recorded for assertions.
pub struct MockBackend {
    pub base_url: String,
    state: MockState,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Answer `route` (e.g. `"GET /api/alerts/summary"`) with `status` and
    /// a JSON body.
    pub fn respond(&self, route: &str, status: u16, body: Value) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(route.to_string(), (status, body));
    }

    pub fn ok(&self, route: &str, body: Value) {
        self.respond(route, 200, body);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests made to `path`, in order.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    /// How many times `path` was hit with exactly `query`.
    pub fn hits(&self, path: &str, query: Option<&str>) -> usize {
        self.requests_to(path)
            .iter()
            .filter(|r| r.query.as_deref() == query)
            .count()
    }

    /// A context pointed at this backend over in-memory session storage.
    pub fn context(&self) -> AppContext {
        self.context_with_storage(Arc::new(MemoryStore::new()))
    }

    pub fn context_with_storage(&self, storage: Arc<dyn KeyValueStore>) -> AppContext {
        let config = ClientConfig {
            api_url: self.base_url.clone(),
            ..ClientConfig::default()
        };
        AppContext::with_storage(config, storage).unwrap()
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    });

    let route = format!("{method} {path}");
    let registered = state.routes.lock().unwrap().get(&route).cloned();
    match registered {
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap();
            (status, Json(body)).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not Found"}))).into_response(),
    }
}
