//! Everything a front end needs, wired together once.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::api::{AuthApi, BooksApi, ChatApi, HttpClient, ReqwestTransport, Transport, UsersApi};
use crate::auth::{AuthFlow, SessionContext, TokenStore};
use crate::config::Config;
use crate::nav::Navigator;
use crate::queries::{AuthQueries, BookQueries, ChatQueries, UserQueries};
use crate::query::QueryClient;

/// Shared handles for one running client. Cloning is cheap; every clone
/// talks to the same session, cache and token store.
#[derive(Clone)]
pub struct ElibClient {
    pub http: HttpClient,
    pub session: Arc<SessionContext>,
    pub queries: QueryClient,
    pub books: BookQueries,
    pub users: UserQueries,
    pub current_user: AuthQueries,
    pub chat: ChatQueries,
    pub auth: AuthFlow,
}

impl ElibClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_query_client(transport, tokens, navigator, QueryClient::new())
    }

    /// Same wiring around a caller-supplied cache
    pub fn with_query_client(
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        queries: QueryClient,
    ) -> Self {
        let http = HttpClient::new(transport, tokens.clone(), navigator.clone());
        let auth_api = AuthApi::new(http.clone());
        let session = Arc::new(SessionContext::new(tokens.clone(), auth_api.clone()));

        Self {
            books: BookQueries::new(BooksApi::new(http.clone()), queries.clone()),
            users: UserQueries::new(UsersApi::new(http.clone()), queries.clone()),
            current_user: AuthQueries::new(auth_api.clone(), tokens, queries.clone()),
            chat: ChatQueries::new(ChatApi::new(http.clone()), queries.clone()),
            auth: AuthFlow::new(auth_api, session.clone(), queries.clone(), navigator),
            http,
            session,
            queries,
        }
    }

    /// Production wiring: reqwest transport against the configured backend.
    pub fn from_config(
        config: &Config,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let base_url = config.api_base_url();
        let transport = ReqwestTransport::new(&base_url)
            .with_context(|| format!("Failed to create HTTP client for {}", base_url))?;
        info!(%base_url, "Using Elib backend");
        Ok(Self::new(Arc::new(transport), tokens, navigator))
    }

    /// Tear down the in-memory state. The stored token is left alone so the
    /// next start can hydrate from it.
    pub fn shutdown(&self) {
        self.queries.clear();
        self.session.teardown();
    }
}
