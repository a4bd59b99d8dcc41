use tracing::{debug, info};

use crate::models::{LoginResult, NewUser, TokenResponse, UserProfile};

use super::{ApiError, ApiRequest, HttpClient};

#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Exchange credentials for a token, then fetch the profile with it.
    ///
    /// The profile request carries the new token explicitly: it has not been
    /// persisted yet, so the pipeline cannot supply it. Persisting is left
    /// to the caller once both steps succeed.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, ApiError> {
        let request = ApiRequest::post("/token")
            .form(&[("username", email), ("password", password)]);
        let token: TokenResponse = self.http.send_json(request).await?;

        if token.access_token.is_empty() {
            return Err(ApiError::InvalidResponse(
                "Token response did not contain an access token".to_string(),
            ));
        }
        debug!(token_type = %token.token_type, "Access token issued");

        let user = self.current_user_with_token(&token.access_token).await?;
        info!(user_id = user.user_id, "Login handshake complete");

        Ok(LoginResult {
            access_token: token.access_token,
            user,
        })
    }

    pub async fn register(&self, user: &NewUser) -> Result<UserProfile, ApiError> {
        self.http.post_json("/users/", user).await
    }

    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.http.get_json("/users/me").await
    }

    /// Profile lookup with an explicit token. A rejection here never
    /// redirects: callers are either on the login page or restoring a
    /// session in the background.
    pub async fn current_user_with_token(&self, token: &str) -> Result<UserProfile, ApiError> {
        let request = ApiRequest::get("/users/me").bearer(token).no_redirect();
        self.http.send_json(request).await
    }
}
