//! User-facing auth actions.
//!
//! These tie the pieces together: the network call, the session, the query
//! cache and navigation. The view only decides when to call them and how to
//! show a failure.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::api::{ApiError, AuthApi};
use crate::models::{NewUser, UserProfile};
use crate::nav::{Navigator, Route};
use crate::queries::auth_keys;
use crate::query::QueryClient;

use super::SessionContext;

#[derive(Clone)]
pub struct AuthFlow {
    api: AuthApi,
    session: Arc<SessionContext>,
    queries: QueryClient,
    navigator: Arc<dyn Navigator>,
}

impl AuthFlow {
    pub fn new(
        api: AuthApi,
        session: Arc<SessionContext>,
        queries: QueryClient,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            session,
            queries,
            navigator,
        }
    }

    /// Token handshake, then record the session and go home. On failure the
    /// session is left exactly as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let result = self.api.login(email, password).await?;

        self.session
            .login(result.user.clone(), &result.access_token)
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        self.queries
            .set_query_data(auth_keys::current_user(), &result.user);
        self.navigator.navigate(Route::Home);
        Ok(result.user)
    }

    /// Always ends on the login page with an empty cache, even if the
    /// stored token could not be removed.
    pub fn logout(&self) -> Result<()> {
        let result = self.session.logout();
        if let Err(e) = &result {
            warn!(error = %e, "Failed to clear stored token on logout");
        }
        self.queries.clear();
        self.navigator.navigate(Route::Login);
        result
    }

    pub async fn register(&self, user: &NewUser) -> Result<UserProfile, ApiError> {
        let created = self.api.register(user).await?;
        info!(user_id = created.user_id, "Account created");
        self.navigator.navigate(Route::Login);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HttpClient;
    use crate::auth::{MemoryTokenStore, TokenStore};
    use crate::query::QueryKey;
    use crate::testing::{json_response, status_response, RecordingNavigator, ScriptedTransport};

    const ANN: &str = r#"{"user_id": 1, "user_name": "Ann"}"#;

    struct Harness {
        flow: AuthFlow,
        session: Arc<SessionContext>,
        queries: QueryClient,
        tokens: Arc<MemoryTokenStore>,
        nav: Arc<RecordingNavigator>,
        transport: Arc<ScriptedTransport>,
    }

    fn harness(transport: ScriptedTransport, at: Route) -> Harness {
        let transport = Arc::new(transport);
        let tokens = Arc::new(MemoryTokenStore::new());
        let nav = Arc::new(RecordingNavigator::at(at));
        let http = HttpClient::new(transport.clone(), tokens.clone(), nav.clone());
        let api = AuthApi::new(http);
        let session = Arc::new(SessionContext::new(tokens.clone(), api.clone()));
        let queries = QueryClient::new();
        let flow = AuthFlow::new(api, session.clone(), queries.clone(), nav.clone());
        Harness {
            flow,
            session,
            queries,
            tokens,
            nav,
            transport,
        }
    }

    fn login_backend() -> ScriptedTransport {
        ScriptedTransport::new(|req| match req.path.as_str() {
            "/token" => Ok(json_response(200, r#"{"access_token": "tok-9", "token_type": "bearer"}"#)),
            _ => Ok(json_response(200, ANN)),
        })
    }

    #[tokio::test]
    async fn test_login_records_session_and_goes_home() {
        let h = harness(login_backend(), Route::Login);

        let user = h.flow.login("ann@example.com", "secret").await.unwrap();

        assert_eq!(user.user_id, 1);
        let snap = h.session.snapshot();
        assert!(snap.is_logged_in);
        assert_eq!(snap.token.as_deref(), Some("tok-9"));
        assert_eq!(h.tokens.get().as_deref(), Some("tok-9"));
        assert_eq!(
            h.queries.get_query_data::<UserProfile>(&auth_keys::current_user()),
            Some(user)
        );
        assert_eq!(h.nav.history(), vec![Route::Home]);
    }

    #[tokio::test]
    async fn test_failed_login_changes_nothing() {
        let h = harness(ScriptedTransport::always(status_response(401)), Route::Login);

        let result = h.flow.login("ann@example.com", "wrong").await;

        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert!(!h.session.snapshot().is_logged_in);
        assert!(h.tokens.get().is_none());
        assert!(h.nav.history().is_empty());
        assert_eq!(h.transport.paths(), vec!["/token"]);
    }

    #[tokio::test]
    async fn test_logout_clears_cache_and_redirects() {
        let h = harness(login_backend(), Route::Login);
        h.flow.login("ann@example.com", "secret").await.unwrap();
        h.queries
            .set_query_data(QueryKey::from(["books", "list"]), &vec![1, 2, 3]);

        h.flow.logout().unwrap();

        let snap = h.session.snapshot();
        assert!(!snap.is_logged_in);
        assert!(snap.user.is_none());
        assert!(snap.token.is_none());
        assert!(h.tokens.get().is_none());
        assert!(h.queries.is_empty());
        assert_eq!(h.nav.history(), vec![Route::Home, Route::Login]);
    }

    #[tokio::test]
    async fn test_register_then_login_page() {
        let h = harness(ScriptedTransport::always(json_response(201, ANN)), Route::Signup);
        let user = NewUser {
            user_name: "Ann".to_string(),
            first_name: "Ann".to_string(),
            second_name: "Lee".to_string(),
            email: "ann@example.com".to_string(),
            password: "secret1".to_string(),
            phone: Some("555-0100".to_string()),
        };

        h.flow.register(&user).await.unwrap();

        assert_eq!(h.nav.history(), vec![Route::Login]);
        assert!(!h.session.snapshot().is_logged_in);
    }

    #[tokio::test]
    async fn test_failed_register_stays_put() {
        let h = harness(
            ScriptedTransport::always(json_response(400, r#"{"detail": "Email already registered"}"#)),
            Route::Signup,
        );
        let user = NewUser {
            user_name: "Ann".to_string(),
            first_name: "Ann".to_string(),
            second_name: "Lee".to_string(),
            email: "ann@example.com".to_string(),
            password: "secret1".to_string(),
            phone: None,
        };

        let result = h.flow.register(&user).await;

        let err = result.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(err.user_message(), "Email already registered");
        assert!(h.nav.history().is_empty());
    }
}
