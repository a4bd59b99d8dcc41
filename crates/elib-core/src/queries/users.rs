use std::time::Duration;

use crate::api::{ApiError, UsersApi};
use crate::models::{NewUser, UserProfile, UserUpdate};
use crate::query::{QueryClient, QueryOptions, QueryState};

/// Profiles change rarely
pub const PROFILE_STALE_TIME: Duration = Duration::from_secs(10 * 60);

pub const USER_LIST_STALE_TIME: Duration = Duration::from_secs(60);

pub mod user_keys {
    use crate::query::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::from(["user"])
    }

    pub fn profile() -> QueryKey {
        all().with("profile")
    }

    pub fn list() -> QueryKey {
        all().with("list")
    }
}

#[derive(Clone)]
pub struct UserQueries {
    api: UsersApi,
    client: QueryClient,
}

impl UserQueries {
    pub fn new(api: UsersApi, client: QueryClient) -> Self {
        Self { api, client }
    }

    pub async fn profile(&self) -> QueryState<UserProfile> {
        let api = self.api.clone();
        let options = QueryOptions::default().stale_time(PROFILE_STALE_TIME);
        self.client
            .fetch(user_keys::profile(), &options, move || {
                let api = api.clone();
                async move { api.current_user().await }
            })
            .await
    }

    pub async fn list(&self) -> QueryState<Vec<UserProfile>> {
        let api = self.api.clone();
        let options = QueryOptions::default().stale_time(USER_LIST_STALE_TIME);
        self.client
            .fetch(user_keys::list(), &options, move || {
                let api = api.clone();
                async move { api.list_users().await }
            })
            .await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<UserProfile, ApiError> {
        self.client
            .mutate(self.api.create_user(user), &[user_keys::all()])
            .await
    }

    pub async fn update_user(
        &self,
        user_id: i64,
        update: &UserUpdate,
    ) -> Result<UserProfile, ApiError> {
        self.client
            .mutate(self.api.update_user(user_id, update), &[user_keys::all()])
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::Method;

    use super::*;
    use crate::api::HttpClient;
    use crate::auth::MemoryTokenStore;
    use crate::nav::Route;
    use crate::testing::{json_response, RecordingNavigator, ScriptedTransport};

    const ANN: &str = r#"{"user_id": 1, "user_name": "ann", "email": "ann@example.com"}"#;

    fn queries_with(transport: Arc<ScriptedTransport>) -> UserQueries {
        let tokens = Arc::new(MemoryTokenStore::with_token("tok"));
        let nav = Arc::new(RecordingNavigator::at(Route::Profile));
        let api = UsersApi::new(HttpClient::new(transport, tokens, nav));
        UserQueries::new(api, QueryClient::new())
    }

    fn list_and_create_transport() -> Arc<ScriptedTransport> {
        Arc::new(ScriptedTransport::new(|req| {
            if req.method == Method::POST {
                Ok(json_response(201, ANN))
            } else {
                Ok(json_response(200, &format!("[{}]", ANN)))
            }
        }))
    }

    #[tokio::test]
    async fn test_profile_cached_for_ten_minutes() {
        let transport = Arc::new(ScriptedTransport::always(json_response(200, ANN)));
        let queries = queries_with(transport.clone());

        let first = queries.profile().await;
        let second = queries.profile().await;

        assert_eq!(first.data().map(|u| u.user_id), Some(1));
        assert!(matches!(second, QueryState::Success { is_stale: false, .. }));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_create_user_refetches_user_list() {
        let transport = list_and_create_transport();
        let queries = queries_with(transport.clone());

        queries.list().await;
        queries.list().await;
        assert_eq!(transport.call_count(), 1);

        let new_user = NewUser {
            user_name: "bo".to_string(),
            first_name: "Bo".to_string(),
            second_name: "Ek".to_string(),
            email: "bo@example.com".to_string(),
            password: "secret1".to_string(),
            phone: None,
        };
        queries.create_user(&new_user).await.unwrap();
        assert_eq!(transport.call_count(), 2);

        queries.list().await;
        assert_eq!(transport.call_count(), 3);
        assert_eq!(transport.paths(), vec!["/users", "/users", "/users"]);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_list_cached() {
        let transport = Arc::new(ScriptedTransport::new(|req| {
            if req.method == Method::POST {
                Ok(json_response(422, r#"{"detail": "email taken"}"#))
            } else {
                Ok(json_response(200, "[]"))
            }
        }));
        let queries = queries_with(transport.clone());

        queries.list().await;
        let user = NewUser {
            user_name: "bo".to_string(),
            first_name: String::new(),
            second_name: String::new(),
            email: "bo@example.com".to_string(),
            password: "secret1".to_string(),
            phone: None,
        };
        let result = queries.create_user(&user).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));

        queries.list().await;
        assert_eq!(transport.call_count(), 2);
    }
}
