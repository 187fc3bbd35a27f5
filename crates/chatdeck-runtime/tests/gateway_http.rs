//! HttpChatGateway against a mock HTTP server.

use chatdeck_core::chat::Role;
use chatdeck_runtime::{ChatGateway, GatewayConfig, GatewayError, HttpChatGateway};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> HttpChatGateway {
    let config = GatewayConfig::new(format!("{}/api/", server.uri()), "secret", "agent-7")
        .unwrap()
        .with_organization_id("org-1");
    HttpChatGateway::new(config).unwrap()
}

#[tokio::test]
async fn create_session_posts_first_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/createchat"))
        .and(header("x-api-key", "secret"))
        .and(body_json(json!({"agent_id": "agent-7", "message": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "thread_id": "thread_1",
                "messages": [
                    {"id": "m1", "role": "user", "content": "hello", "created_at": 10},
                    {"id": "m2", "role": "assistant",
                     "content": [{"type": "text", "text": {"value": "hi there"}}],
                     "created_at": 11}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = gateway(&server).create_session("hello").await.unwrap();
    assert_eq!(created.session_id, "thread_1");
    assert_eq!(created.messages.len(), 2);
    assert_eq!(created.messages[1].role, Role::Assistant);
    assert_eq!(created.messages[1].text(), "hi there");
}

#[tokio::test]
async fn create_session_without_thread_id_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/createchat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": []})))
        .mount(&server)
        .await;

    let err = gateway(&server).create_session("hello").await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingField("thread_id")));
}

#[tokio::test]
async fn send_message_carries_ids_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/createmessage"))
        .and(header("x-api-key", "secret"))
        .and(query_param("threadId", "thread_1"))
        .and(query_param("assistantId", "OpenWorks"))
        .and(query_param("agentId", "agent-7"))
        .and(query_param("organizationId", "org-1"))
        .and(query_param("userId", "user-9"))
        .and(body_json(json!({"content": "next", "role": "user"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = gateway(&server)
        .send_message("thread_1", "next", "user-9")
        .await
        .unwrap();
    assert_eq!(receipt.status.as_deref(), Some("queued"));
}

#[tokio::test]
async fn list_messages_reads_message_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/getmessages/thread_1"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"id": "m2", "role": "assistant", "content": "b", "created_at": 2},
                {"id": "m1", "role": "user", "content": "a", "created_at": 1}
            ]
        })))
        .mount(&server)
        .await;

    let messages = gateway(&server).list_messages("thread_1").await.unwrap();
    let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["m2", "m1"]);
}

#[tokio::test]
async fn history_entry_posts_source() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/create_chat_history"))
        .and(body_json(json!({
            "agent_id": "agent-7",
            "thread_id": "thread_1",
            "name": "Trip plans",
            "source": "Frontend-Custom"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server)
        .create_history_entry("thread_1", "Trip plans")
        .await
        .unwrap();
}

#[tokio::test]
async fn non_success_status_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/getmessages/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such thread"))
        .mount(&server)
        .await;

    let err = gateway(&server).list_messages("gone").await.unwrap_err();
    match err {
        GatewayError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such thread");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/getmessages/t"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = gateway(&server).list_messages("t").await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
}
