//! Guided tour of the Agent HUD client.
//!
//! Demonstrates:
//! - Discovering and registering with a running HUD
//! - Streaming markdown, code, logs, notifications and progress
//! - Asking the operator for approval, a choice and clarification
//!
//! Usage:
//!   cargo run --example hud_demo
//!   cargo run --example hud_demo -- --debug
//!   cargo run --example hud_demo -- --no-ask

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use agent_hud::{
    Code, LogEntry, LogLevel, Markdown, Notification, NotificationKind, Progress, Result, Session,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Args
// ============================================================================

#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    no_ask: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            no_ask: args.iter().any(|a| a == "--no-ask"),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug { "agent_hud=debug" } else { "agent_hud=info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Agent HUD Demo ===\n");

    // ========================================================================
    // Connect
    // ========================================================================

    println!("[1] Looking for the HUD...");

    let session = Session::builder()
        .name("Demo Agent")
        .metadata("language", "rust")
        .metadata("demo", true)
        .build()?;
    session.start().await?;

    if let (Some(endpoint), Some(agent_id)) = (session.endpoint(), session.agent_id()) {
        println!("    ✓ Registered as {agent_id} at {}\n", endpoint.ws_url());
    }

    // ========================================================================
    // Content
    // ========================================================================

    println!("[2] Streaming content...");

    session
        .emit_markdown(
            Markdown::new("## Demo started\n\nThis agent will walk through every emission kind.")
                .with_title("Welcome"),
        )
        .await?;

    session
        .emit_code(
            Code::new("fn main() {\n    println!(\"hello, HUD\");\n}")
                .with_language("rust")
                .with_description("The smallest agent"),
        )
        .await?;

    for step in 1..=5 {
        session
            .show_progress(Progress::new(step, 5).with_message(format!("Step {step} of 5")))
            .await?;
        session
            .emit_log(LogEntry::new(format!("Finished step {step}")).with_level(LogLevel::Info))
            .await?;
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    session
        .emit_notification(
            Notification::new("Demo", "All steps finished").with_kind(NotificationKind::Success),
        )
        .await?;

    println!("    ✓ Content sent\n");

    // ========================================================================
    // Human Input
    // ========================================================================

    if args.no_ask {
        println!("[3] [--no-ask] Skipping operator prompts\n");
    } else {
        println!("[3] Asking the operator (60s each)...");
        let wait = Some(Duration::from_secs(60));

        let approved = session
            .request_approval("Publish the demo report", Some(json!({"pages": 3})), wait)
            .await?;
        println!("    Approval: {approved}");

        let flavor = session
            .request_choice("Pick a flavor", ["vanilla", "chocolate"], None, wait)
            .await?;
        println!("    Choice: {}", flavor.as_deref().unwrap_or("(no answer)"));

        let note = session.request_context("Anything to add?", wait).await?;
        println!("    Note: {}\n", note.as_deref().unwrap_or("(no answer)"));
    }

    // ========================================================================
    // Disconnect
    // ========================================================================

    println!("[4] Disconnecting...");
    session.disconnect();
    println!("    ✓ Done");

    Ok(())
}
