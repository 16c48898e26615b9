use std::time::Duration;

use companion_client::{
    BackendConfig, ChatBackend, ChatError, ChatRequest, HttpChatBackend, StudentProfile,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> HttpChatBackend {
    HttpChatBackend::new(BackendConfig::new(server.uri(), Duration::from_secs(5)))
        .expect("client should build")
}

fn first_request(message: &str) -> ChatRequest {
    ChatRequest::new(message, None, StudentProfile::default().to_user_context())
}

#[tokio::test]
async fn chat_posts_profile_context_and_parses_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "message": "Can you review my resume?",
            "session_id": null,
            "user_context": {
                "student_id": "CS2021001",
                "name": "Rahul",
                "department": "CSE",
                "cgpa": 7.5,
                "skills": "Python, Java",
                "year": 3,
                "arrears_count": 0
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Sure, upload it",
            "session_id": "abc123def456",
            "domain": "resume_review",
            "suggested_actions": ["Upload resume", "Ask about formatting"],
            "sources": ["handbook.pdf"],
            "timestamp": "2024-05-01T10:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let reply = backend
        .send_chat(first_request("Can you review my resume?"))
        .await
        .expect("chat should succeed");

    assert_eq!(reply.response, "Sure, upload it");
    assert_eq!(reply.session_id, "abc123def456");
    assert_eq!(reply.domain.as_deref(), Some("resume_review"));
    assert_eq!(
        reply.suggested_actions,
        vec!["Upload resume".to_string(), "Ask about formatting".to_string()]
    );
    assert_eq!(reply.sources, Some(vec!["handbook.pdf".to_string()]));
}

#[tokio::test]
async fn follow_up_request_echoes_session_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "session_id": "abc123def456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Next step",
            "session_id": "abc123def456"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let request = ChatRequest::new(
        "What next?",
        Some("abc123def456".to_string()),
        StudentProfile::default().to_user_context(),
    );
    let reply = backend.send_chat(request).await.expect("chat should succeed");

    assert!(reply.suggested_actions.is_empty());
    assert_eq!(reply.sources, None);
}

#[tokio::test]
async fn non_success_status_maps_to_server_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string(r#"{"detail":"Chat error: boom"}"#),
        )
        .mount(&server)
        .await;

    let error = backend_for(&server)
        .send_chat(first_request("hello"))
        .await
        .unwrap_err();

    match &error {
        ChatError::ServerStatus { status, body, .. } => {
            assert_eq!(*status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected server status error, got {other:?}"),
    }
    assert!(error.is_transient());
}

#[tokio::test]
async fn garbage_body_maps_to_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let error = backend_for(&server)
        .send_chat(first_request("hello"))
        .await
        .unwrap_err();

    assert!(matches!(error, ChatError::MalformedResponse { .. }));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn unreachable_backend_maps_to_network_error() {
    // Reserve a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let uri = format!("http://127.0.0.1:{port}");
    let backend = HttpChatBackend::new(BackendConfig::new(uri, Duration::from_secs(2)))
        .expect("client should build");
    let error = backend
        .send_chat(first_request("hello"))
        .await
        .unwrap_err();

    assert!(matches!(error, ChatError::Network { .. }), "{error:?}");
}

#[tokio::test]
async fn health_and_history_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "service": "Career Companion",
            "version": "1.0.0"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/session/abc123/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "abc123",
            "messages": [
                { "role": "user", "content": "hi", "timestamp": "2024-05-01T10:00:00" },
                { "role": "assistant", "content": "hello", "timestamp": "2024-05-01T10:00:01" }
            ]
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);

    let health = backend.health().await.expect("health should succeed");
    assert!(health.is_healthy());
    assert_eq!(health.version.as_deref(), Some("1.0.0"));

    let history = backend
        .session_history("abc123")
        .await
        .expect("history should succeed");
    assert_eq!(history.messages.len(), 2);
    assert_eq!(history.messages[1].role, "assistant");
}
