use serde::{Deserialize, Serialize};

use super::UserProfile;

/// Body of a successful `POST /token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Outcome of the two-step login handshake: the issued token and the
/// profile fetched with it. Nothing is persisted yet at this point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    pub access_token: String,
    pub user: UserProfile,
}
