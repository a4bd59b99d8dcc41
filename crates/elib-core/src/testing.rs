//! Test doubles for the transport and navigator seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::StatusCode;

use crate::api::{ApiError, ApiRequest, ApiResponse, Transport};
use crate::nav::{Navigator, Route};

type Responder = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync>;

pub fn json_response(status: u16, body: &str) -> ApiResponse {
    let status = StatusCode::from_u16(status).expect("valid status code");
    ApiResponse::new(status, body.as_bytes().to_vec())
}

pub fn status_response(status: u16) -> ApiResponse {
    json_response(status, r#"{"detail":"scripted"}"#)
}

/// Answers every request through a closure and records what was sent.
pub struct ScriptedTransport {
    responder: Responder,
    offline: bool,
    delay: Option<Duration>,
    requests: Mutex<Vec<ApiRequest>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            offline: false,
            delay: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(response: ApiResponse) -> Self {
        Self::new(move |_| Ok(response.clone()))
    }

    /// Every request fails to connect, with the error reqwest reports for
    /// a refused connection
    pub fn failing() -> Self {
        let mut transport = Self::always(status_response(200));
        transport.offline = true;
        transport
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, ApiError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.offline {
                return Err(ApiError::from(refused_connection().await));
            }
            (self.responder)(&request)
        })
    }
}

/// Dial a loopback port that was free a moment ago
async fn refused_connection() -> reqwest::Error {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("free loopback port")
        .port();
    match reqwest::Client::new()
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await
    {
        Err(e) => e,
        Ok(response) => panic!("unexpected answer from port {port}: {}", response.status()),
    }
}

/// Navigator that remembers every redirect it was asked to perform.
pub struct RecordingNavigator {
    current: Mutex<Route>,
    history: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn at(route: Route) -> Self {
        Self {
            current: Mutex::new(route),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current(&self) -> Route {
        *self.current.lock().unwrap()
    }

    fn navigate(&self, route: Route) {
        *self.current.lock().unwrap() = route;
        self.history.lock().unwrap().push(route);
    }
}
