//! In-process mock HUD for integration tests.
//!
//! Accepts WebSocket clients on loopback, records every frame they send,
//! acknowledges registration and optionally answers input requests. Tests
//! can also push raw frames or close the current client.

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::net::TcpListener as StdListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use agent_hud::Session;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

// ============================================================================
// Constants
// ============================================================================

pub const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Logging
// ============================================================================

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// MockHud
// ============================================================================

enum Control {
    Send(String),
    Close,
}

#[derive(Default)]
struct Recorded {
    frames: Mutex<Vec<Value>>,
    client: Mutex<Option<mpsc::UnboundedSender<Control>>>,
    connections: AtomicUsize,
}

#[derive(Clone)]
struct Behavior {
    agent_id: Option<String>,
    auto_answer: Option<String>,
    upgrade_delay: Duration,
}

/// Builder for [`MockHud`].
pub struct MockHudBuilder {
    port: u16,
    behavior: Behavior,
}

impl MockHudBuilder {
    /// Binds a specific port instead of an ephemeral one.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Acknowledges registration with this agent ID (default `agent-1`).
    pub fn agent_id(mut self, agent_id: &str) -> Self {
        self.behavior.agent_id = Some(agent_id.to_owned());
        self
    }

    /// Never acknowledges registration.
    pub fn silent(mut self) -> Self {
        self.behavior.agent_id = None;
        self
    }

    /// Holds each accepted TCP stream for `delay` before the upgrade.
    pub fn upgrade_delay(mut self, delay: Duration) -> Self {
        self.behavior.upgrade_delay = delay;
        self
    }

    /// Answers every input request with `text`.
    pub fn auto_answer(mut self, text: &str) -> Self {
        self.behavior.auto_answer = Some(text.to_owned());
        self
    }

    pub async fn spawn(self) -> MockHud {
        let listener = TcpListener::bind(("127.0.0.1", self.port))
            .await
            .expect("mock bind");
        let port = listener.local_addr().expect("mock addr").port();
        let recorded = Arc::new(Recorded::default());

        let task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&recorded),
            self.behavior,
        ));

        MockHud {
            port,
            recorded,
            task,
        }
    }
}

/// A running mock HUD.
pub struct MockHud {
    port: u16,
    recorded: Arc<Recorded>,
    task: JoinHandle<()>,
}

impl MockHud {
    pub fn builder() -> MockHudBuilder {
        MockHudBuilder {
            port: 0,
            behavior: Behavior {
                agent_id: Some("agent-1".to_owned()),
                auto_answer: None,
                upgrade_delay: Duration::ZERO,
            },
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Builds a session that only scans this mock's port.
    pub fn session(&self, name: &str) -> Session {
        Session::builder()
            .name(name)
            .port_range(self.port, self.port)
            .probe_timeout(Duration::from_millis(200))
            .discovery_timeout(Duration::from_secs(2))
            .handshake_timeout(Duration::from_secs(2))
            .response_grace(Duration::from_millis(100))
            .build()
            .expect("session build")
    }

    /// All frames received so far, across connections.
    pub fn frames(&self) -> Vec<Value> {
        self.recorded.frames.lock().clone()
    }

    /// Received frames of one `type`.
    pub fn frames_of(&self, message_type: &str) -> Vec<Value> {
        self.frames()
            .into_iter()
            .filter(|f| f["type"] == message_type)
            .collect()
    }

    /// Number of WebSocket clients accepted.
    pub fn connections(&self) -> usize {
        self.recorded.connections.load(Ordering::SeqCst)
    }

    /// Waits until `count` frames of `message_type` have arrived.
    pub async fn wait_for(&self, message_type: &str, count: usize) -> Vec<Value> {
        let deadline = Instant::now() + WAIT;
        loop {
            let frames = self.frames_of(message_type);
            if frames.len() >= count {
                return frames;
            }
            assert!(
                Instant::now() < deadline,
                "expected {count} '{message_type}' frames, got {}",
                frames.len()
            );
            sleep(Duration::from_millis(10)).await;
        }
    }

    /// Sends an answer for `request_id` to the current client.
    pub fn respond(&self, request_id: &Value, text: &str) {
        self.send_json(json!({
            "type": "human-input-response",
            "requestId": request_id,
            "response": text,
            "timestamp": "2026-01-01T00:00:00Z",
        }));
    }

    pub fn send_json(&self, value: Value) {
        self.send_raw(&value.to_string());
    }

    pub fn send_raw(&self, text: &str) {
        let client = self.recorded.client.lock();
        let client = client.as_ref().expect("no client connected");
        client
            .send(Control::Send(text.to_owned()))
            .expect("client gone");
    }

    /// Closes the current client's socket.
    pub fn close_client(&self) {
        if let Some(client) = self.recorded.client.lock().take() {
            let _ = client.send(Control::Close);
        }
    }
}

impl Drop for MockHud {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn accept_loop(listener: TcpListener, recorded: Arc<Recorded>, behavior: Behavior) {
    while let Ok((stream, _)) = listener.accept().await {
        let recorded = Arc::clone(&recorded);
        let behavior = behavior.clone();
        tokio::spawn(async move {
            if !behavior.upgrade_delay.is_zero() {
                sleep(behavior.upgrade_delay).await;
            }
            // Discovery probes connect and hang up without upgrading.
            let Ok(ws) = accept_async(stream).await else {
                return;
            };
            recorded.connections.fetch_add(1, Ordering::SeqCst);
            serve(ws, recorded, behavior).await;
        });
    }
}

async fn serve(ws: WebSocketStream<TcpStream>, recorded: Arc<Recorded>, behavior: Behavior) {
    let (mut write, mut read) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    *recorded.client.lock() = Some(tx);

    loop {
        tokio::select! {
            message = read.next() => {
                let text = match message {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => continue,
                };
                let Ok(frame) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                recorded.frames.lock().push(frame.clone());

                let reply = match frame["type"].as_str() {
                    Some("register-agent") => behavior.agent_id.as_ref().map(|id| {
                        json!({
                            "type": "registration-ack",
                            "success": true,
                            "agentId": id,
                            "serverTime": "2026-01-01T00:00:00Z",
                        })
                    }),
                    Some("human-input-request") => behavior.auto_answer.as_ref().map(|answer| {
                        json!({
                            "type": "human-input-response",
                            "requestId": frame["requestId"],
                            "response": answer,
                        })
                    }),
                    _ => None,
                };

                if let Some(reply) = reply
                    && write.send(Message::Text(reply.to_string().into())).await.is_err()
                {
                    break;
                }
            }

            control = rx.recv() => match control {
                Some(Control::Send(text)) => {
                    if write.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(Control::Close) | None => {
                    let _ = write.close().await;
                    break;
                }
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Finds `len` consecutive loopback ports that are currently free.
pub fn free_window(len: u16) -> u16 {
    for _ in 0..64 {
        let seed = StdListener::bind("127.0.0.1:0").expect("bind");
        let base = seed.local_addr().expect("addr").port();
        drop(seed);

        let Some(last) = base.checked_add(len - 1) else {
            continue;
        };
        if (base..=last).all(|p| StdListener::bind(("127.0.0.1", p)).is_ok()) {
            return base;
        }
    }
    panic!("no free port window");
}

/// Binds an ephemeral loopback port that accepts TCP but never answers
/// the WebSocket upgrade.
pub async fn spawn_mute_listener() -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let task = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    (port, task)
}

/// Binds an ephemeral loopback port that answers every upgrade with 404.
pub async fn spawn_rejecting_listener() -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let task = tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0_u8; 1024];
                if matches!(stream.read(&mut buf).await, Ok(n) if n > 0) {
                    let _ = stream
                        .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
                        .await;
                    let _ = stream.shutdown().await;
                }
            });
        }
    });
    (port, task)
}

/// Polls `condition` until it holds or [`WAIT`] elapses.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        sleep(Duration::from_millis(10)).await;
    }
}
