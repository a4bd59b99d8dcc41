use std::sync::Arc;
use std::time::Duration;

use crate::api::AuthApi;
use crate::auth::TokenStore;
use crate::models::UserProfile;
use crate::query::{QueryClient, QueryOptions, QueryState};

pub const CURRENT_USER_STALE_TIME: Duration = Duration::from_secs(10 * 60);

pub mod auth_keys {
    use crate::query::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::from(["auth"])
    }

    pub fn current_user() -> QueryKey {
        all().with("currentUser")
    }
}

#[derive(Clone)]
pub struct AuthQueries {
    api: AuthApi,
    tokens: Arc<dyn TokenStore>,
    client: QueryClient,
}

impl AuthQueries {
    pub fn new(api: AuthApi, tokens: Arc<dyn TokenStore>, client: QueryClient) -> Self {
        Self {
            api,
            tokens,
            client,
        }
    }

    /// The logged-in user. Only runs while a token is stored, and a
    /// rejection is final: retrying a dead token cannot help.
    pub async fn current_user(&self) -> QueryState<UserProfile> {
        let options = QueryOptions::default()
            .stale_time(CURRENT_USER_STALE_TIME)
            .retry(0)
            .enabled(self.tokens.has_token());
        let api = self.api.clone();
        self.client
            .fetch(auth_keys::current_user(), &options, move || {
                let api = api.clone();
                async move { api.current_user().await }
            })
            .await
    }
}
