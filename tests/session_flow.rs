//! End-to-end session lifecycle against a mock HUD.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use agent_hud::protocol::{InboundMessage, OutboundMessage};
use agent_hud::{Error, Markdown, Session, SessionState};
use anyhow::Result;
use common::{
    MockHud, eventually, free_window, spawn_mute_listener, spawn_rejecting_listener,
};
use serde_json::json;
use serial_test::serial;

// ============================================================================
// Start-up
// ============================================================================

#[tokio::test]
#[serial]
async fn discovers_middle_port_and_answers_choice() -> Result<()> {
    common::init_logging();
    let base = free_window(3);
    let mock = MockHud::builder()
        .port(base + 1)
        .agent_id("abc123")
        .auto_answer("b")
        .spawn()
        .await;

    let session = Session::builder()
        .name("Chooser")
        .port_range(base, base + 2)
        .probe_timeout(Duration::from_millis(200))
        .build()?;
    session.start().await?;

    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.agent_id().map(|id| id.to_string()), Some("abc123".into()));
    assert_eq!(session.endpoint().map(|e| e.port()), Some(base + 1));

    let picked = session
        .request_choice("pick one", ["a", "b"], None, None)
        .await?;
    assert_eq!(picked.as_deref(), Some("b"));

    let requests = mock.frames_of("human-input-request");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["message"], "pick one");
    assert_eq!(requests[0]["inputType"], "choice");
    assert_eq!(requests[0]["options"], json!(["a", "b"]));
    assert_eq!(requests[0]["timeout"], 300);
    assert!(
        requests[0]["requestId"]
            .as_str()
            .is_some_and(|id| id.starts_with("req_"))
    );
    Ok(())
}

#[tokio::test]
async fn registration_carries_identity() -> Result<()> {
    let mock = MockHud::builder().spawn().await;
    let session = Session::builder()
        .name("Build Bot")
        .metadata("version", "1.4.0")
        .port_range(mock.port(), mock.port())
        .build()?;
    session.start().await?;

    let registrations = mock.frames_of("register-agent");
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0]["name"], "Build Bot");
    assert_eq!(registrations[0]["metadata"], json!({"version": "1.4.0"}));
    assert_eq!(session.identity().name(), "Build Bot");
    Ok(())
}

#[tokio::test]
#[serial]
async fn empty_range_fails_with_discovery_timeout() {
    let base = free_window(2);
    let session = Session::builder()
        .port_range(base, base + 1)
        .probe_timeout(Duration::from_millis(100))
        .build()
        .expect("build");

    let err = session.start().await.unwrap_err();

    assert!(matches!(err, Error::DiscoveryTimeout { start, end, .. } if start == base && end == base + 1));
    assert!(err.is_startup_error());
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn silent_hud_fails_with_handshake_timeout() {
    let mock = MockHud::builder().silent().spawn().await;
    let session = Session::builder()
        .port_range(mock.port(), mock.port())
        .handshake_timeout(Duration::from_millis(200))
        .build()
        .expect("build");

    let err = session.start().await.unwrap_err();

    assert!(matches!(err, Error::HandshakeTimeout { timeout_ms: 200 }));
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.agent_id(), None);
    assert_eq!(session.endpoint(), None);
}

#[tokio::test]
async fn send_during_handshake_is_not_ready() {
    let mock = MockHud::builder().silent().spawn().await;
    let session = Session::builder()
        .port_range(mock.port(), mock.port())
        .handshake_timeout(Duration::from_secs(2))
        .build()
        .expect("build");

    let starter = {
        let session = session.clone();
        tokio::spawn(async move { session.start().await })
    };
    eventually(|| session.state() == SessionState::Handshaking).await;

    let message = OutboundMessage::MarkdownContent {
        data: agent_hud::protocol::ContentData::new(Markdown::new("too early"), None, "x"),
    };
    let err = session.send(&message).await.unwrap_err();
    assert!(matches!(err, Error::NotReady { message_type: "markdown-content" }));

    // Convenience emissions report the session as not connected.
    assert!(matches!(
        session.emit_markdown(Markdown::new("too early")).await,
        Err(Error::NotConnected)
    ));

    session.disconnect();
    let result = starter.await.expect("join");
    assert!(result.is_err());
    assert_eq!(session.state(), SessionState::Closed);
    assert!(mock.frames_of("markdown-content").is_empty());
}

#[tokio::test]
async fn start_is_noop_when_ready() -> Result<()> {
    let mock = MockHud::builder().spawn().await;
    let session = mock.session("Idempotent");

    session.start().await?;
    session.start().await?;

    assert_eq!(mock.connections(), 1);
    assert_eq!(mock.frames_of("register-agent").len(), 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_starts_are_serialized() -> Result<()> {
    let mock = MockHud::builder().spawn().await;
    let session = mock.session("Racer");

    let (a, b) = tokio::join!(session.start(), session.start());
    a?;
    b?;

    assert!(session.is_connected());
    assert_eq!(mock.connections(), 1);
    Ok(())
}

#[tokio::test]
async fn listener_that_never_upgrades_fails_with_connect_failed() {
    let (port, _listener) = spawn_mute_listener().await;
    let session = Session::builder()
        .port_range(port, port)
        .connect_timeout(Duration::from_millis(300))
        .build()
        .expect("build");

    let err = session.start().await.unwrap_err();

    assert!(matches!(err, Error::ConnectFailed { port: p, .. } if p == port));
    assert!(err.is_startup_error());
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.endpoint(), None);
    assert_eq!(session.agent_id(), None);
}

#[tokio::test]
async fn rejected_upgrade_fails_with_connect_failed() {
    let (port, _listener) = spawn_rejecting_listener().await;
    let session = Session::builder()
        .port_range(port, port)
        .build()
        .expect("build");

    let err = session.start().await.unwrap_err();

    assert!(matches!(err, Error::ConnectFailed { port: p, .. } if p == port));
    assert!(err.is_connection_error());
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.endpoint(), None);
}

// ============================================================================
// Close and Restart
// ============================================================================

#[tokio::test]
async fn disconnect_while_connecting_wins() -> Result<()> {
    let mock = MockHud::builder()
        .upgrade_delay(Duration::from_millis(300))
        .spawn()
        .await;
    let session = mock.session("Quitter");

    let starter = {
        let session = session.clone();
        tokio::spawn(async move { session.start().await })
    };
    eventually(|| session.state() == SessionState::Connecting).await;

    session.disconnect();
    assert_eq!(session.state(), SessionState::Closed);

    let result = starter.await?;
    assert!(matches!(result, Err(Error::ConnectionClosed)));
    assert_eq!(session.state(), SessionState::Closed);
    assert!(!session.is_connected());
    assert_eq!(session.endpoint(), None);

    // The abandoned socket never registers.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(mock.frames_of("register-agent").is_empty());

    // A later start is unaffected.
    session.start().await?;
    assert!(session.is_connected());
    Ok(())
}

#[tokio::test]
async fn disconnect_then_restart() -> Result<()> {
    let mock = MockHud::builder().spawn().await;
    let session = mock.session("Restarter");

    session.start().await?;
    session.disconnect();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.agent_id(), None);
    assert!(matches!(
        session.emit_markdown(Markdown::new("x")).await,
        Err(Error::NotConnected)
    ));

    session.start().await?;
    assert!(session.is_connected());
    assert_eq!(mock.connections(), 2);
    assert_eq!(mock.frames_of("register-agent").len(), 2);
    Ok(())
}

#[tokio::test]
async fn peer_close_moves_session_to_closed() -> Result<()> {
    let mock = MockHud::builder().spawn().await;
    let session = mock.session("Abandoned");
    session.start().await?;

    let request = {
        let session = session.clone();
        tokio::spawn(async move {
            session
                .request_approval("keep going", None, Some(Duration::from_millis(300)))
                .await
        })
    };
    mock.wait_for("human-input-request", 1).await;

    mock.close_client();
    eventually(|| session.state() == SessionState::Closed).await;
    assert!(!session.is_connected());
    assert_eq!(session.agent_id(), None);

    // The outstanding request runs out its own timeout.
    let approved = request.await??;
    assert!(!approved);
    assert_eq!(session.pending_count(), 0);
    Ok(())
}

// ============================================================================
// Observer
// ============================================================================

#[tokio::test]
async fn observer_sees_unhandled_frames() -> Result<()> {
    let mock = MockHud::builder().spawn().await;
    let session = mock.session("Watcher");

    let seen = Arc::new(AtomicUsize::new(0));
    {
        let seen = Arc::clone(&seen);
        session.set_observer(move |message: &InboundMessage| {
            if message.message_type() == "agent-connected" {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });
    }
    session.start().await?;

    mock.send_json(json!({"type": "agent-connected", "agent": {"name": "other"}}));
    eventually(|| seen.load(Ordering::SeqCst) == 1).await;

    session.clear_observer();
    mock.send_json(json!({"type": "agent-connected"}));
    mock.send_raw("{broken");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert!(session.is_connected());
    Ok(())
}
