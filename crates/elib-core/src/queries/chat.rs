use crate::api::{ApiError, ChatApi};
use crate::models::{ChatResponse, ChatSession, DocumentUploadResponse};
use crate::query::{QueryClient, QueryOptions, QueryState};

pub mod chat_keys {
    use crate::query::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::from(["chat"])
    }

    pub fn sessions() -> QueryKey {
        all().with("sessions")
    }

    pub fn session(session_id: &str) -> QueryKey {
        sessions().with(session_id)
    }
}

#[derive(Clone)]
pub struct ChatQueries {
    api: ChatApi,
    client: QueryClient,
}

impl ChatQueries {
    pub fn new(api: ChatApi, client: QueryClient) -> Self {
        Self { api, client }
    }

    pub async fn sessions(&self) -> QueryState<Vec<ChatSession>> {
        let api = self.api.clone();
        self.client
            .fetch(chat_keys::sessions(), &QueryOptions::default(), move || {
                let api = api.clone();
                async move { api.list_sessions().await }
            })
            .await
    }

    pub async fn session(&self, session_id: &str) -> QueryState<ChatSession> {
        let session_id = session_id.to_string();
        let options = QueryOptions::default().enabled(!session_id.is_empty());
        let key = chat_keys::session(&session_id);
        let api = self.api.clone();
        self.client
            .fetch(key, &options, move || {
                let api = api.clone();
                let session_id = session_id.clone();
                async move { api.get_session(&session_id).await }
            })
            .await
    }

    /// Send a message. Session lists (and the session itself, which lives
    /// under the same prefix) go stale on success.
    pub async fn send_message(
        &self,
        session_id: &str,
        message: &str,
        document_hash: Option<&str>,
    ) -> Result<ChatResponse, ApiError> {
        self.client
            .mutate(
                self.api.send_message(session_id, message, document_hash),
                &[chat_keys::sessions()],
            )
            .await
    }

    pub async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentUploadResponse, ApiError> {
        self.client
            .mutate(self.api.upload_document(file_name, bytes), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::HttpClient;
    use crate::auth::MemoryTokenStore;
    use crate::nav::Route;
    use crate::query::QueryKey;
    use crate::testing::{json_response, RecordingNavigator, ScriptedTransport};

    const SESSION: &str = r#"{"session_id": "s-1", "messages": [], "created_at": "2024-05-01T10:00:00", "updated_at": "2024-05-01T10:00:00"}"#;
    const REPLY: &str = r#"{"session_id": "s-1", "user_message": "hi", "assistant_response": "hello", "timestamp": "2024-05-01T10:00:01"}"#;

    fn queries_with(transport: Arc<ScriptedTransport>) -> (ChatQueries, QueryClient) {
        let tokens = Arc::new(MemoryTokenStore::with_token("tok"));
        let nav = Arc::new(RecordingNavigator::at(Route::Books));
        let client = QueryClient::new();
        let api = ChatApi::new(HttpClient::new(transport, tokens, nav));
        (ChatQueries::new(api, client.clone()), client)
    }

    #[test]
    fn test_session_key_nests_under_sessions() {
        assert!(chat_keys::session("s-1").starts_with(&chat_keys::sessions()));
        assert!(chat_keys::sessions().starts_with(&chat_keys::all()));
    }

    #[tokio::test]
    async fn test_send_message_invalidates_sessions() {
        let transport = Arc::new(ScriptedTransport::new(|req| {
            if req.path == "/rag/chat" {
                Ok(json_response(200, REPLY))
            } else {
                Ok(json_response(200, &format!("[{}]", SESSION)))
            }
        }));
        let (queries, client) = queries_with(transport.clone());
        let sessions: Vec<ChatSession> = vec![serde_json::from_str(SESSION).unwrap()];
        client.set_query_data(chat_keys::sessions(), &sessions);
        client.set_query_data(QueryKey::from(["user", "profile"]), &"ann");

        let reply = queries.send_message("s-1", "hi", None).await.unwrap();

        assert_eq!(reply.assistant_response, "hello");
        assert!(client.is_stale(&chat_keys::sessions()));
        let profile: Option<String> = client.get_query_data(&QueryKey::from(["user", "profile"]));
        assert_eq!(profile.as_deref(), Some("ann"));

        let refreshed = queries.sessions().await;
        assert_eq!(refreshed.data().map(Vec::len), Some(1));
        assert_eq!(transport.paths(), vec!["/rag/chat", "/rag/sessions/"]);
    }

    #[tokio::test]
    async fn test_empty_session_id_is_disabled() {
        let transport = Arc::new(ScriptedTransport::always(json_response(200, SESSION)));
        let (queries, _) = queries_with(transport.clone());

        assert!(queries.session("").await.is_idle());
        assert_eq!(transport.call_count(), 0);
    }
}
