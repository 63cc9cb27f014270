//! Agent console end-to-end flows over a mock HTTP backend
//!
//! Exercises the console engine with the real `HttpBackend` against
//! wiremock: the compound join protocol and polling behavior around the
//! terminal state.

use serde_json::json;
use std::sync::Arc;

use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use deskwire::backend::HttpBackend;
use deskwire::config::{BackendConfig, ConsoleConfig};
use deskwire::engine::{ActionOutcome, AgentConsoleSyncEngine};
use deskwire::events::EventBus;
use deskwire::session::ClientMode;

fn console_engine(uri: &str) -> AgentConsoleSyncEngine<HttpBackend> {
    let backend = Arc::new(
        HttpBackend::new(&BackendConfig {
            base_url: uri.to_string(),
            timeout_seconds: 5,
        })
        .unwrap(),
    );
    AgentConsoleSyncEngine::new(backend, ConsoleConfig::default(), EventBus::default())
}

fn session_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "email": "pat@example.com",
        "name": "Pat",
        "status": status,
        "assigned_agent": null,
        "created_at": "2024-05-01T12:00:00Z",
        "updated_at": "2024-05-01T12:05:00Z"
    })
}

fn message_json(id: &str, sender: &str, body: &str, ts: &str) -> serde_json::Value {
    json!({ "id": id, "body": body, "sender": sender, "timestamp": ts })
}

#[tokio::test]
async fn test_join_protocol_updates_posts_and_confirms() {
    let server = MockServer::start().await;

    // Display: the session is waiting for an agent with one customer
    // message on record.
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(session_json("sess-1", "waiting_agent")),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([message_json(
            "m-1",
            "user",
            "I need help",
            "2024-05-01T12:00:00Z"
        )])))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    // Join: status update with the identity attached, then the synthetic
    // join message.
    let mut joined = session_json("sess-1", "agent_active");
    joined["assigned_agent"] =
        json!({"name": "Ethan Parker", "email": "ethan.parker@deskwire.io"});
    Mock::given(method("PATCH"))
        .and(path("/api/chat/sessions/sess-1"))
        .and(body_json(json!({
            "status": "agent_active",
            "assigned_agent": {"name": "Ethan Parker", "email": "ethan.parker@deskwire.io"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(joined.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat/sessions/sess-1/agent-messages"))
        .and(body_json(json!({
            "text": "Ethan Parker joined the chat.",
            "agent_name": "Ethan Parker",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(message_json(
            "m-2",
            "agent",
            "Ethan Parker joined the chat.",
            "2024-05-01T12:00:05Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    // Confirmation re-fetch after the join.
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(joined))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            message_json("m-1", "user", "I need help", "2024-05-01T12:00:00Z"),
            message_json(
                "m-2",
                "agent",
                "Ethan Parker joined the chat.",
                "2024-05-01T12:00:05Z"
            ),
        ])))
        .mount(&server)
        .await;

    let mut console = console_engine(&server.uri());
    console.select_identity("Ethan Parker").await.unwrap();
    console.open_session("sess-1").await.unwrap();
    assert_eq!(console.mode(), ClientMode::Waiting);

    let outcome = console.join().await.unwrap();

    assert_eq!(outcome, ActionOutcome::Completed);
    assert_eq!(console.mode(), ClientMode::Agent);
    assert_eq!(
        console.session().unwrap().assigned_agent.as_ref().unwrap().name,
        "Ethan Parker"
    );
    assert!(console
        .messages()
        .iter()
        .any(|m| m.body == "Ethan Parker joined the chat."));
}

#[tokio::test]
async fn test_console_polls_until_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json("sess-2", "active")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-2/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    // The conversation ends server-side.
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json("sess-2", "ended")))
        .mount(&server)
        .await;

    let mut console = console_engine(&server.uri());
    console.open_session("sess-2").await.unwrap();
    assert!(console.wants_polling());

    console.poll_once().await.unwrap();
    assert_eq!(console.mode(), ClientMode::Ai);

    console.poll_once().await.unwrap();
    assert_eq!(console.mode(), ClientMode::Ended);
    // Terminal: polling stops but the transcript stays displayed.
    assert!(!console.wants_polling());
    assert!(console.session().is_some());
}

#[tokio::test]
async fn test_console_poll_survives_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json("sess-3", "active")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-3/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-3"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut console = console_engine(&server.uri());
    console.open_session("sess-3").await.unwrap();

    // A transient server error does not clear the displayed session.
    console.poll_once().await.unwrap();
    assert!(console.session_id().is_some());
}
