use std::sync::Arc;
use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use chatline::{
    ChatClient, ChatRole, ChatSession, ConnectivityProbe, HttpTransport, Language, SendOutcome,
    UiState,
};

struct FixedProbe(bool);

#[async_trait]
impl ConnectivityProbe for FixedProbe {
    async fn is_online(&self) -> bool {
        self.0
    }
}

fn client_for(server: &MockServer, online: bool) -> ChatClient {
    ChatClient::new(
        ChatSession::new("client-123".to_string(), Language::English),
        Arc::new(HttpTransport::new(&format!("{}/api/chat", server.uri()))),
        Arc::new(FixedProbe(online)),
    )
}

async fn reply_text(status: u16, body: &str) -> String {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;

    let mut client = client_for(&server, true);
    assert_eq!(client.send_text(Some("hi")).await, SendOutcome::Sent);
    assert_eq!(client.messages().len(), 2);
    assert_eq!(client.state(), UiState::Idle);
    client.messages().last().unwrap().text.clone()
}

#[tokio::test]
async fn test_request_carries_header_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("X-Client-Id", "client-123"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "text": "hello there",
            "clientId": "client-123",
            "language": "en",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "hi back" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server, true);
    client.send_text(Some("  hello there ")).await;

    let messages: Vec<_> = client.messages().iter().collect();
    assert_eq!(messages[0].role, ChatRole::User);
    assert_eq!(messages[0].text, "hello there");
    assert_eq!(messages[1].role, ChatRole::Assistant);
    assert_eq!(messages[1].text, "hi back");
}

#[tokio::test]
async fn test_text_reply() {
    assert_eq!(reply_text(200, r#"{"text":"hello"}"#).await, "hello");
}

#[tokio::test]
async fn test_empty_object_reply_is_instability() {
    assert_eq!(reply_text(200, "{}").await, Language::English.network_unstable());
}

#[tokio::test]
async fn test_unrecognised_object_is_pretty_printed() {
    assert_eq!(reply_text(200, r#"{"foo":"bar"}"#).await, "{\n  \"foo\": \"bar\"\n}");
}

#[tokio::test]
async fn test_404_and_502_are_instability() {
    assert_eq!(reply_text(404, "Not Found").await, Language::English.network_unstable());
    assert_eq!(reply_text(502, r#"{"error":"bad gateway"}"#).await, Language::English.network_unstable());
}

#[tokio::test]
async fn test_server_error_uses_status_line_and_detail() {
    assert_eq!(
        reply_text(500, r#"{"error":"model overloaded"}"#).await,
        "HTTP 500 Internal Server Error — model overloaded"
    );
}

#[tokio::test]
async fn test_unreachable_endpoint_while_offline() {
    // Nothing listens on port 9 of localhost
    let mut client = ChatClient::new(
        ChatSession::new("client-123".to_string(), Language::Chinese),
        Arc::new(HttpTransport::new("http://127.0.0.1:9/api/chat")),
        Arc::new(FixedProbe(false)),
    );

    client.send_text(Some("你好")).await;
    assert_eq!(client.messages().len(), 2);
    assert_eq!(client.messages().last().unwrap().text, Language::Chinese.offline());
    assert_eq!(client.state(), UiState::Idle);
}

#[tokio::test]
async fn test_unreachable_endpoint_while_online_shows_error() {
    let mut client = ChatClient::new(
        ChatSession::new("client-123".to_string(), Language::English),
        Arc::new(HttpTransport::new("http://127.0.0.1:9/api/chat")),
        Arc::new(FixedProbe(true)),
    );

    client.send_text(Some("hi")).await;
    let reply = &client.messages().last().unwrap().text;
    assert_ne!(reply, Language::English.offline());
    assert!(!reply.is_empty());
}
