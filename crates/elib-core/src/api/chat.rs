use crate::models::{ChatMessageRequest, ChatResponse, ChatSession, DocumentUploadResponse};

use super::{ApiError, ApiRequest, HttpClient};

#[derive(Clone)]
pub struct ChatApi {
    http: HttpClient,
}

impl ChatApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Ask the assistant a question, optionally scoped to one uploaded document
    pub async fn send_message(
        &self,
        session_id: &str,
        message: &str,
        document_hash: Option<&str>,
    ) -> Result<ChatResponse, ApiError> {
        let payload = ChatMessageRequest {
            content: message.to_string(),
            session_id: session_id.to_string(),
        };

        let mut request = ApiRequest::post("/rag/chat").json(&payload)?;
        if let Some(hash) = document_hash {
            request = request.query("hash", hash);
        }
        self.http.send_json(request).await
    }

    pub async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentUploadResponse, ApiError> {
        let request = ApiRequest::post("/rag/documents").multipart("file", file_name, bytes);
        self.http.send_json(request).await
    }

    pub async fn list_sessions(&self) -> Result<Vec<ChatSession>, ApiError> {
        self.http.get_json("/rag/sessions/").await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<ChatSession, ApiError> {
        self.http
            .get_json(&format!("/rag/sessions/{}", session_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::RequestBody;
    use crate::auth::MemoryTokenStore;
    use crate::nav::Route;
    use crate::testing::{json_response, RecordingNavigator, ScriptedTransport};

    const REPLY: &str = r#"{"session_id": "s-1", "user_message": "hi", "assistant_response": "hello", "timestamp": "2024-05-01T10:00:00"}"#;

    fn api_with(transport: Arc<ScriptedTransport>) -> ChatApi {
        let tokens = Arc::new(MemoryTokenStore::with_token("tok"));
        let nav = Arc::new(RecordingNavigator::at(Route::Books));
        ChatApi::new(HttpClient::new(transport, tokens, nav))
    }

    #[tokio::test]
    async fn test_send_message_payload() {
        let transport = Arc::new(ScriptedTransport::always(json_response(200, REPLY)));
        let api = api_with(transport.clone());

        let reply = api.send_message("s-1", "hi", None).await.unwrap();

        assert_eq!(reply.assistant_response, "hello");
        let sent = &transport.requests()[0];
        assert_eq!(sent.path, "/rag/chat");
        assert!(sent.query.is_empty());
        assert_eq!(
            sent.body,
            RequestBody::Json(serde_json::json!({"content": "hi", "session_id": "s-1"}))
        );
    }

    #[tokio::test]
    async fn test_send_message_scoped_to_document() {
        let transport = Arc::new(ScriptedTransport::always(json_response(200, REPLY)));
        let api = api_with(transport.clone());

        api.send_message("s-1", "hi", Some("abc123")).await.unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.query, vec![("hash".to_string(), "abc123".to_string())]);
    }

    #[tokio::test]
    async fn test_upload_document_is_multipart() {
        let transport = Arc::new(ScriptedTransport::always(json_response(
            200,
            r#"{"document_id": "d-1", "title": "notes.pdf", "hash": "h", "chunk_count": 3, "uploaded_at": "2024-05-01T10:00:00"}"#,
        )));
        let api = api_with(transport.clone());

        let uploaded = api
            .upload_document("notes.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();

        assert_eq!(uploaded.chunk_count, 3);
        match &transport.requests()[0].body {
            RequestBody::Multipart { field, file_name, bytes } => {
                assert_eq!(field, "file");
                assert_eq!(file_name, "notes.pdf");
                assert_eq!(bytes.as_slice(), b"%PDF-1.4");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }
}
