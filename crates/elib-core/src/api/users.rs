use crate::models::{NewUser, UserProfile, UserUpdate};

use super::{ApiError, HttpClient};

#[derive(Clone)]
pub struct UsersApi {
    http: HttpClient,
}

impl UsersApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.http.get_json("/users/me").await
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, ApiError> {
        self.http.get_json("/users").await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<UserProfile, ApiError> {
        self.http.post_json("/users", user).await
    }

    pub async fn update_user(
        &self,
        user_id: i64,
        update: &UserUpdate,
    ) -> Result<UserProfile, ApiError> {
        self.http
            .put_json(&format!("/users/{}", user_id), update)
            .await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        self.http.delete(&format!("/users/{}", user_id)).await
    }
}
