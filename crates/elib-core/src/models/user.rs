use serde::{Deserialize, Serialize};

/// The signed-in user as returned by `/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub user_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub second_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UserProfile {
    /// "First Second", falling back to the user name when both are blank
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.second_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.user_name.clone()
        } else {
            full.to_string()
        }
    }

    /// Two-letter badge shown in the navbar
    pub fn initials(&self) -> String {
        let source = if self.first_name.is_empty() {
            self.user_name.as_str()
        } else {
            self.first_name.as_str()
        };
        let mut initials: String = source.chars().take(1).collect();
        initials.extend(self.second_name.chars().take(1));
        initials.to_uppercase()
    }

    pub fn phone_display(&self) -> &str {
        self.phone.as_deref().unwrap_or("-")
    }
}

/// Registration payload for `POST /users/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub user_name: String,
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Partial update for `PUT /users/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> UserProfile {
        UserProfile {
            user_id: 1,
            user_name: "ann".to_string(),
            first_name: "Ann".to_string(),
            second_name: "Lee".to_string(),
            email: "ann@example.com".to_string(),
            phone: None,
        }
    }

    #[test]
    fn test_parse_minimal_profile() {
        let json = r#"{"user_id": 1, "user_name": "Ann"}"#;
        let user: UserProfile = serde_json::from_str(json).expect("minimal profile parses");
        assert_eq!(user.user_id, 1);
        assert_eq!(user.full_name(), "Ann");
        assert_eq!(user.phone_display(), "-");
    }

    #[test]
    fn test_full_name_and_initials() {
        let user = ann();
        assert_eq!(user.full_name(), "Ann Lee");
        assert_eq!(user.initials(), "AL");
    }

    #[test]
    fn test_user_update_omits_unset_fields() {
        let update = UserUpdate {
            phone: Some("555".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"phone":"555"}"#);
    }
}
