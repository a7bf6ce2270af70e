use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mdchat::backend::{ChatBackend, HttpBackend};
use mdchat::config::BackendConfig;
use mdchat::MdChatError;

mod common;

fn network_error(err: anyhow::Error) -> bool {
    err.downcast_ref::<MdChatError>()
        .map(MdChatError::is_network)
        .unwrap_or(false)
}

#[tokio::test]
async fn test_create_conversation_returns_chat_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/new_chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chat_id": "c-42"})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(common::backend_config(&server)).unwrap();
    assert_eq!(backend.create_conversation().await.unwrap(), "c-42");
}

#[tokio::test]
async fn test_list_conversations_preserves_order() {
    let server = MockServer::start().await;
    common::mount_json(
        &server,
        "GET",
        "/api/list_chats",
        json!({"chats": [
            {"id": "b", "title": "Fever in toddler"},
            {"id": "a", "title": "Migraine"}
        ]}),
    )
    .await;

    let backend = HttpBackend::new(common::backend_config(&server)).unwrap();
    let listed = backend.list_conversations().await.unwrap();
    let ids: Vec<_> = listed.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(listed[0].title.as_deref(), Some("Fever in toddler"));
}

#[tokio::test]
async fn test_get_history_decodes_records() {
    let server = MockServer::start().await;
    common::mount_json(
        &server,
        "GET",
        "/api/history/c1",
        json!({
            "chat_id": "c1",
            "history": [
                {"role": "user", "message": "Hello", "timestamp": "2025-01-01 10:00:00"},
                {"role": "assistant", "message": "Hi there", "timestamp": "2025-01-01 10:00:01"}
            ]
        }),
    )
    .await;

    let backend = HttpBackend::new(common::backend_config(&server)).unwrap();
    let history = backend.get_history("c1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, "assistant");
    assert_eq!(history[1].message, "Hi there");
}

#[tokio::test]
async fn test_send_message_posts_chat_id_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({"chat_id": "c1", "message": "Hello"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"reply": "Hi there", "is_medical": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(common::backend_config(&server)).unwrap();
    let reply = backend.send_message("c1", "Hello").await.unwrap();
    assert_eq!(reply.reply, "Hi there");
    assert_eq!(reply.is_medical, Some(false));
}

#[tokio::test]
async fn test_delete_conversation_uses_history_route() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/history/c1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "deleted", "chat_id": "c1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(common::backend_config(&server)).unwrap();
    backend.delete_conversation("c1").await.unwrap();
}

#[tokio::test]
async fn test_health_checks_root() {
    let server = MockServer::start().await;
    common::mount_json(&server, "GET", "/", json!({"status": "backend running"})).await;

    let backend = HttpBackend::new(common::backend_config(&server)).unwrap();
    backend.health().await.unwrap();
}

#[tokio::test]
async fn test_error_status_is_network_failure() {
    let server = MockServer::start().await;
    common::mount_status(&server, "POST", "/api/chat", 500).await;

    let backend = HttpBackend::new(common::backend_config(&server)).unwrap();
    let err = backend.send_message("c1", "Hello").await.unwrap_err();
    assert!(network_error(err));
}

#[tokio::test]
async fn test_undecodable_body_is_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/list_chats"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(common::backend_config(&server)).unwrap();
    let err = backend.list_conversations().await.unwrap_err();
    assert!(network_error(err));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_failure() {
    // Nothing listens on port 9 of the loopback interface.
    let backend = HttpBackend::new(BackendConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_seconds: 2,
    })
    .unwrap();

    let err = backend.create_conversation().await.unwrap_err();
    assert!(err.to_string().contains("create conversation"));
    assert!(matches!(
        err.downcast_ref::<MdChatError>(),
        Some(MdChatError::Http(_))
    ));
    assert!(network_error(err));
}
