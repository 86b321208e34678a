//! Process-wide default session against a mock HUD.

mod common;

use agent_hud::{Error, LogLevel, registry};
use anyhow::Result;
use common::MockHud;
use serial_test::serial;

#[tokio::test]
#[serial(registry)]
async fn default_session_convenience_calls() -> Result<()> {
    let mock = MockHud::builder().auto_answer("yes").spawn().await;
    let session = mock.session("Scripted");
    session.start().await?;
    registry::init(session);

    registry::emit_markdown("# Nightly").await?;
    registry::emit_log("checkout done", LogLevel::Info).await?;
    assert!(registry::request_approval("tag release").await?);

    let markdown = &mock.wait_for("markdown-content", 1).await[0];
    assert_eq!(markdown["data"]["content"], "# Nightly");
    assert_eq!(markdown["data"]["agent_name"], "Scripted");

    let log = &mock.wait_for("agent-message", 1).await[0];
    assert_eq!(log["payload"]["message"], "checkout done");
    assert_eq!(log["payload"]["level"], "info");

    let installed = registry::get().expect("installed");
    registry::teardown();

    assert!(registry::get().is_none());
    assert!(!installed.is_connected());
    assert!(matches!(
        registry::emit_markdown("after").await,
        Err(Error::NotConnected)
    ));
    Ok(())
}
