//! Customer widget end-to-end flows over a mock HTTP backend
//!
//! Exercises the widget engine with the real `HttpBackend` against
//! wiremock: escalation, agent handoff convergence, offline degradation,
//! and server-side conversation deletion.

use serde_json::json;
use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use deskwire::backend::HttpBackend;
use deskwire::config::{BackendConfig, NotificationConfig, WidgetConfig};
use deskwire::engine::ClientSyncEngine;
use deskwire::events::EventBus;
use deskwire::notify::{NotificationDispatcher, TerminalNotifier};
use deskwire::session::{ClientMode, Sender};

fn widget_engine(uri: &str) -> ClientSyncEngine<HttpBackend> {
    let backend = Arc::new(
        HttpBackend::new(&BackendConfig {
            base_url: uri.to_string(),
            timeout_seconds: 5,
        })
        .unwrap(),
    );
    let notifications = NotificationDispatcher::new(
        Box::new(TerminalNotifier),
        &NotificationConfig {
            enabled: false,
            ..Default::default()
        },
    );
    let config = WidgetConfig {
        agent_followup_delay_ms: 5,
        offline_reply_delay_ms: 5,
        ..Default::default()
    };
    ClientSyncEngine::new(backend, config, EventBus::default(), notifications)
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

async fn mount_create(server: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat/sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_json(id, "active")))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_escalation_request_fires_and_discards_canned_reply() {
    let server = MockServer::start().await;
    mount_create(&server, "sess-1").await;

    // The backend happens to generate an automated reply for the send;
    // the escalating client must drop it.
    Mock::given(method("POST"))
        .and(path("/api/chat/sessions/sess-1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": session_json("sess-1", "active"),
            "reply": message_json("m-2", "assistant", "canned answer", "2024-05-01T12:00:01Z"),
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat/sessions/sess-1/escalate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(session_json("sess-1", "waiting_agent")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut widget = widget_engine(&server.uri());
    widget
        .start_session("pat@example.com", Some("Pat"))
        .await
        .unwrap();

    widget.send("I want to talk to agent").await.unwrap();

    assert_eq!(widget.mode(), ClientMode::Waiting);
    assert!(widget.messages().iter().all(|m| m.sender != Sender::Assistant));
}

#[tokio::test]
async fn test_agent_join_appears_after_next_poll() {
    let server = MockServer::start().await;
    mount_create(&server, "sess-2").await;
    Mock::given(method("POST"))
        .and(path("/api/chat/sessions/sess-2/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": session_json("sess-2", "active"),
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat/sessions/sess-2/escalate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(session_json("sess-2", "waiting_agent")),
        )
        .mount(&server)
        .await;

    let mut widget = widget_engine(&server.uri());
    widget.start_session("pat@example.com", None).await.unwrap();
    widget.send("talk to agent please").await.unwrap();
    assert_eq!(widget.mode(), ClientMode::Waiting);

    // Server-side, an agent has joined since: the status moved and a
    // synthetic join message was appended.
    let mut joined = session_json("sess-2", "agent_active");
    joined["assigned_agent"] = json!({"name": "Ethan Parker", "email": "ethan@deskwire.io"});
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(joined))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-2/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            message_json("m-1", "user", "talk to agent please", "2024-05-01T12:00:00Z"),
            message_json(
                "m-2",
                "agent",
                "Ethan Parker joined the chat.",
                "2024-05-01T12:00:05Z"
            ),
        ])))
        .mount(&server)
        .await;

    widget.poll_once().await.unwrap();

    assert_eq!(widget.mode(), ClientMode::Agent);
    assert!(widget
        .messages()
        .iter()
        .any(|m| m.body == "Ethan Parker joined the chat."));
    // The widget is closed, so the join message counts as unread.
    assert_eq!(widget.unread(), 1);
}

#[tokio::test]
async fn test_backend_going_away_degrades_to_offline() {
    // The server lives only long enough to create the session; dropping
    // it leaves the port refusing connections.
    let uri;
    let mut widget;
    {
        let server = MockServer::start().await;
        mount_create(&server, "sess-3").await;
        uri = server.uri();
        widget = widget_engine(&uri);
        widget.start_session("pat@example.com", None).await.unwrap();
    }

    widget.send("how much does it cost?").await.unwrap();

    assert!(widget.is_offline());
    let last = widget.messages().last().unwrap();
    assert_eq!(last.sender, Sender::Assistant);
    assert!(last.body.contains("Pricing"));
}

#[tokio::test]
async fn test_server_side_deletion_replaces_list_wholesale() {
    let server = MockServer::start().await;
    mount_create(&server, "sess-4").await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(session_json("sess-4", "agent_active")),
        )
        .mount(&server)
        .await;

    // First poll sees two messages, the next sees the conversation wiped.
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-4/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            message_json("m-1", "user", "hello", "2024-05-01T12:00:00Z"),
            message_json("m-2", "agent", "hi", "2024-05-01T12:00:01Z"),
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-4/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut widget = widget_engine(&server.uri());
    widget.start_session("pat@example.com", None).await.unwrap();

    widget.poll_once().await.unwrap();
    assert_eq!(widget.messages().len(), 2);

    widget.poll_once().await.unwrap();
    assert!(widget.messages().is_empty());
}

#[tokio::test]
async fn test_session_gone_server_side_hard_resets() {
    let server = MockServer::start().await;
    mount_create(&server, "sess-5").await;

    // The send's snapshot reports the session already moved to waiting
    // (the other side escalated it), putting the widget into a polling
    // mode without any keyword of its own.
    Mock::given(method("POST"))
        .and(path("/api/chat/sessions/sess-5/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": session_json("sess-5", "waiting_agent"),
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/sess-5"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    let mut widget = widget_engine(&server.uri());
    widget.start_session("pat@example.com", None).await.unwrap();
    widget.send("hello").await.unwrap();
    assert_eq!(widget.mode(), ClientMode::Waiting);

    // The session disappears; the next poll resets local state.
    widget.poll_once().await.unwrap();

    assert!(widget.session_id().is_none());
    assert!(widget.messages().is_empty());
    assert_eq!(widget.mode(), ClientMode::Ai);
}
