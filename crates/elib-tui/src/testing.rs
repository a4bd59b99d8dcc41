//! Offline backend for exercising `App` without a server.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use reqwest::StatusCode;

use elib_core::api::{ApiError, ApiRequest, ApiResponse, Transport};
use elib_core::auth::MemoryTokenStore;
use elib_core::{Config, ElibClient, QueryClient, Route, RouteState};

use crate::app::App;

type Responder = Box<dyn Fn(&ApiRequest) -> (u16, String) + Send + Sync>;

/// Answers each request with the status and body the closure picks for it
pub struct FakeBackend {
    responder: Responder,
    paths: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> (u16, String) + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn always(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::new(move |_| (status, body.clone()))
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Transport for FakeBackend {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, ApiError>> {
        self.paths.lock().unwrap().push(request.path.clone());
        let (status, body) = (self.responder)(&request);
        let status = StatusCode::from_u16(status).unwrap();
        Box::pin(async move { Ok(ApiResponse::new(status, body.into_bytes())) })
    }
}

pub fn test_app(backend: Arc<FakeBackend>, tokens: Arc<MemoryTokenStore>) -> App {
    test_app_with_cache(backend, tokens, QueryClient::new())
}

pub fn test_app_with_cache(
    backend: Arc<FakeBackend>,
    tokens: Arc<MemoryTokenStore>,
    queries: QueryClient,
) -> App {
    let routes = RouteState::new(Route::Landing);
    let client = ElibClient::with_query_client(backend, tokens, Arc::new(routes.clone()), queries);
    App::with_client(Config::default(), client, routes)
}

/// Give spawned tasks a few ticks to finish and fold their results in
pub async fn settle(app: &mut App) {
    for _ in 0..20 {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        app.check_background_tasks();
    }
}
