//! HTTP Chat API
//!
//! `reqwest` client for the research backend. All chat endpoints live under
//! `{base_url}/api/chat`; the health probe hits `{base_url}/api/`.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::traits::{
    Acknowledgement, ChatApi, CreateConversationRequest, SendMessageRequest, SendMessageResponse,
};
use crate::config::CanvasConfig;
use crate::messages::ConversationId;
use crate::session::{ChatMessage, Conversation};

/// Characters left as-is in a path segment (RFC 3986 unreserved)
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Health probes give up sooner than regular requests
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Research backend client
#[derive(Clone, Debug)]
pub struct HttpChatApi {
    /// Base URL without trailing slash, e.g. `http://localhost:8000`
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpChatApi {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let parsed = reqwest::Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl {
                url: base_url,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Network {
                endpoint: base_url.clone(),
                source,
            })?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Create from loaded configuration
    pub fn from_config(config: &CanvasConfig) -> Result<Self, ApiError> {
        Self::new(config.backend_url.clone(), config.request_timeout)
    }

    /// Base URL this client talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn health_url(&self) -> String {
        format!("{}/api/", self.base_url)
    }

    fn chat_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn conversation_endpoint(conversation_id: &ConversationId) -> String {
        format!(
            "/api/chat/conversations/{}",
            utf8_percent_encode(conversation_id.as_str(), PATH_SEGMENT)
        )
    }

    /// Send a request and decode a JSON body
    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.fetch(endpoint, request).await?;
        decode(endpoint, &body)
    }

    /// Send a request and return the raw body of a 2xx response
    async fn fetch(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<String, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Network {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ApiError::Network {
            endpoint: endpoint.to_string(),
            source,
        })?;

        if !status.is_success() {
            tracing::debug!(endpoint, status = status.as_u16(), "Backend returned error status");
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[async_trait]
impl ChatApi for HttpChatApi {
    fn name(&self) -> &'static str {
        "Research API"
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(self.health_url())
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Health check failed");
                false
            }
        }
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let endpoint = "/api/chat/conversations";
        self.execute(endpoint, self.http_client.get(self.chat_url(endpoint)))
            .await
    }

    async fn get_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        let endpoint = Self::conversation_endpoint(conversation_id);
        let request = self.http_client.get(self.chat_url(&endpoint));
        self.execute(&endpoint, request).await
    }

    async fn create_conversation(&self, title: &str) -> Result<Conversation, ApiError> {
        let endpoint = "/api/chat/conversations";
        let body = CreateConversationRequest {
            title: title.to_string(),
        };
        let request = self.http_client.post(self.chat_url(endpoint)).json(&body);
        self.execute(endpoint, request).await
    }

    async fn delete_conversation(&self, conversation_id: &ConversationId) -> Result<(), ApiError> {
        let endpoint = Self::conversation_endpoint(conversation_id);
        let request = self.http_client.delete(self.chat_url(&endpoint));
        let body = self.fetch(&endpoint, request).await?;

        // 204 or an empty 200 is as good as an ack
        if body.trim().is_empty() {
            tracing::debug!(conversation_id = %conversation_id, "Delete acknowledged without body");
            return Ok(());
        }
        let ack: Acknowledgement = decode(&endpoint, &body)?;
        tracing::debug!(
            conversation_id = %conversation_id,
            ack = ack.message.as_deref().unwrap_or(""),
            "Delete acknowledged"
        );
        Ok(())
    }

    async fn send_message(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<SendMessageResponse, ApiError> {
        let endpoint = "/api/chat/message";
        let body = SendMessageRequest {
            conversation_id: conversation_id.clone(),
            content: content.to_string(),
        };
        let request = self.http_client.post(self.chat_url(endpoint)).json(&body);
        self.execute(endpoint, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageRole;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpChatApi {
        HttpChatApi::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn conversation_json(id: &str, title: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "created_at": "2024-05-01T12:00:00Z",
            "updated_at": "2024-05-01T12:30:00Z"
        })
    }

    fn message_json(id: &str, role: &str, content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "conversation_id": "c1",
            "role": role,
            "content": content,
            "timestamp": "2024-05-01T12:01:00Z"
        })
    }

    #[test]
    fn test_base_url_is_normalized() {
        let api = HttpChatApi::new("http://localhost:8000///", Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.health_url(), "http://localhost:8000/api/");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            HttpChatApi::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl { .. })
        ));
        assert!(matches!(
            HttpChatApi::new("ftp://example.com", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_conversation_ids_are_percent_encoded() {
        let endpoint = HttpChatApi::conversation_endpoint(&ConversationId::from("a b/c"));
        assert_eq!(endpoint, "/api/chat/conversations/a%20b%2Fc");

        let plain = HttpChatApi::conversation_endpoint(&ConversationId::from("5f2e-9a_1.x~"));
        assert_eq!(plain, "/api/chat/conversations/5f2e-9a_1.x~");
    }

    #[tokio::test]
    async fn test_list_conversations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                conversation_json("c2", "Second"),
                conversation_json("c1", "First"),
            ])))
            .mount(&server)
            .await;

        let conversations = client(&server).list_conversations().await.unwrap();
        let titles: Vec<_> = conversations.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_get_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                message_json("m1", "user", "question"),
                message_json("m2", "assistant", "answer"),
            ])))
            .mount(&server)
            .await;

        let messages = client(&server)
            .get_messages(&ConversationId::from("c1"))
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[0].conversation_id, Some(ConversationId::from("c1")));
    }

    #[tokio::test]
    async fn test_create_conversation_sends_title() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/conversations"))
            .and(body_json(serde_json::json!({"title": "New Research"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(conversation_json("c1", "New Research")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let created = client(&server)
            .create_conversation("New Research")
            .await
            .unwrap();
        assert_eq!(created.id, ConversationId::from("c1"));
    }

    #[tokio::test]
    async fn test_delete_missing_conversation_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/chat/conversations/gone"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"detail": "Conversation not found"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .delete_conversation(&ConversationId::from("gone"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_conversation_ok() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/chat/conversations/c1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message": "Conversation deleted"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .delete_conversation(&ConversationId::from("c1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_conversation_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/chat/conversations/c1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server)
            .delete_conversation(&ConversationId::from("c1"))
            .await;
        assert!(result.is_ok(), "204 should count as deleted: {result:?}");
    }

    #[tokio::test]
    async fn test_delete_conversation_empty_ok_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/chat/conversations/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server)
            .delete_conversation(&ConversationId::from("c1"))
            .await;
        assert!(result.is_ok(), "empty 200 should count as deleted: {result:?}");
    }

    #[tokio::test]
    async fn test_delete_conversation_garbled_ack_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/chat/conversations/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let result = client(&server)
            .delete_conversation(&ConversationId::from("c1"))
            .await;
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_send_message_posts_untrimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/message"))
            .and(body_json(serde_json::json!({
                "conversation_id": "c1",
                "content": " Why is the sky blue? "
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user_message": message_json("m1", "user", " Why is the sky blue? "),
                "ai_message": message_json("m2", "assistant", "Rayleigh scattering."),
            })))
            .mount(&server)
            .await;

        let response = client(&server)
            .send_message(&ConversationId::from("c1"), " Why is the sky blue? ")
            .await
            .unwrap();
        assert_eq!(response.user_message.role, MessageRole::User);
        assert_eq!(response.ai_message.content, "Rayleigh scattering.");
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server).list_conversations().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message": "Research Agent API"})),
            )
            .mount(&server)
            .await;

        assert!(client(&server).health_check().await);
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // Nothing listens on the discard port
        let api = HttpChatApi::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(!api.health_check().await);
        assert!(matches!(
            api.list_conversations().await,
            Err(ApiError::Network { .. })
        ));
    }
}
