// The backend emits naive ISO-8601 timestamps (no offset).
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::User => "You",
            MessageRole::Assistant => "Elib",
            MessageRole::System => "System",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageRequest {
    pub content: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: String,
    pub role: MessageRole,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub user_message: String,
    pub assistant_response: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ChatSession {
    /// First user message, used as the session title in lists
    pub fn title(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("New conversation")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUploadResponse {
    pub document_id: String,
    pub title: String,
    pub hash: String,
    pub chunk_count: i64,
    pub uploaded_at: NaiveDateTime,
}
