//! The single choke point for outbound REST calls.
//!
//! A request passes through three stages:
//!
//! 1. request stage: attach `Authorization: Bearer <token>` from the token
//!    store unless the request already carries an explicit credential
//! 2. transport: anything implementing [`Transport`] (reqwest in
//!    production, a scripted fake in tests)
//! 3. response stage: 2xx passes through; 401 clears the credential and
//!    redirects to login before the error is handed back to the caller;
//!    everything else becomes an [`ApiError`]
//!
//! No retries happen here.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{header, multipart, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::auth::TokenStore;
use crate::nav::{Navigator, LOGIN_ROUTE};

use super::ApiError;

/// Default backend base URL (local development server)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Request / response
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Multipart {
        field: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    bearer: Option<String>,
    redirect_on_unauthorized: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
            redirect_on_unauthorized: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn multipart(mut self, field: &str, file_name: &str, bytes: Vec<u8>) -> Self {
        self.body = RequestBody::Multipart {
            field: field.to_string(),
            file_name: file_name.to_string(),
            bytes,
        };
        self
    }

    /// Attach a credential explicitly. The request stage leaves it alone.
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// A 401 on this request still clears the credential but does not
    /// send the user to the login page.
    pub fn no_redirect(mut self) -> Self {
        self.redirect_on_unauthorized = false;
        self
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    /// The `Authorization` header value this request will carry
    pub fn authorization(&self) -> Option<String> {
        self.bearer.as_ref().map(|t| format!("Bearer {}", t))
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e))
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ============================================================================
// Transport
// ============================================================================

pub trait Transport: Send + Sync {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, ApiError>>;
}

/// Transport over reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, ApiError>> {
        Box::pin(async move {
            let url = self.url(&request.path);

            let mut builder = self
                .client
                .request(request.method.clone(), &url)
                .header(header::ACCEPT, "application/json");

            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(ref token) = request.bearer {
                builder = builder.bearer_auth(token);
            }

            builder = match request.body {
                RequestBody::Empty => builder,
                RequestBody::Json(value) => builder.json(&value),
                RequestBody::Form(pairs) => builder.form(&pairs),
                RequestBody::Multipart {
                    field,
                    file_name,
                    bytes,
                } => {
                    let part = multipart::Part::bytes(bytes).file_name(file_name);
                    builder.multipart(multipart::Form::new().part(field, part))
                }
            };

            let response = builder.send().await?;
            let status = response.status();
            let body = response.bytes().await?.to_vec();
            Ok(ApiResponse { status, body })
        })
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// HTTP client shared by every domain API module.
/// Clone is cheap - all parts are behind `Arc`.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl HttpClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            tokens,
            navigator,
        }
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    fn prepare(&self, mut request: ApiRequest) -> ApiRequest {
        if request.bearer.is_none() {
            request.bearer = self.tokens.get();
        }
        request
    }

    fn inspect(
        &self,
        response: ApiResponse,
        sent_token: Option<&str>,
        redirect: bool,
    ) -> Result<ApiResponse, ApiError> {
        let status = response.status;
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(sent_token, redirect);
            return Err(ApiError::Unauthorized);
        }
        Err(ApiError::from_status(status, &response.text()))
    }

    fn handle_unauthorized(&self, sent_token: Option<&str>, redirect: bool) {
        // Only clear the credential that was actually rejected; a login that
        // completed while this request was in flight must survive.
        let stored = self.tokens.get();
        if stored.is_some() && stored.as_deref() == sent_token {
            if let Err(e) = self.tokens.remove() {
                warn!(error = %e, "Failed to clear rejected token");
            }
        } else if stored.is_some() {
            debug!("Stored token changed while request was in flight, keeping it");
        }

        if !redirect {
            debug!("Unauthorized response, redirect suppressed for this request");
        } else if self.navigator.current() == LOGIN_ROUTE {
            debug!("Unauthorized response while already on login page");
        } else {
            info!("Credential rejected, redirecting to login");
            self.navigator.navigate(LOGIN_ROUTE);
        }
    }

    /// Run a request through the full pipeline
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = self.prepare(request);
        let redirect = request.redirect_on_unauthorized;
        let sent_token = request.bearer.clone();
        debug!(
            method = %request.method,
            path = %request.path,
            authenticated = request.bearer.is_some(),
            "Sending request"
        );

        let response = self.transport.send(request).await?;
        self.inspect(response, sent_token.as_deref(), redirect)
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.execute(request).await?.json()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(ApiRequest::put(path).json(body)?).await
    }

    /// DELETE, ignoring whatever acknowledgement body comes back
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(path)).await.map(|_| ())
    }
}
