//! NaurBot terminal client
//!
//! A chat client for the NaurBot import-tariff assistant, implementing a
//! conversation session as a state machine over a remote backend.

mod backend;
mod compose;
mod identity;
mod noms;
mod runtime;
mod session;
mod sheet;
mod store;
mod ui;

use backend::{ClientConfig, HttpBackend};
use identity::Identity;
use runtime::SessionRuntime;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ui::ChatApp;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The TUI owns stdout; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "naurbot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Configuration
    let config = ClientConfig::from_env();
    let email = std::env::var("NAURBOT_EMAIL").ok();
    let display_name = std::env::var("NAURBOT_NAME").ok();
    let download_dir = std::env::var("NAURBOT_DOWNLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));

    // Identity is resolved exactly once and passed explicitly from here on.
    let identity = Identity::resolve(email, display_name);
    tracing::info!(
        backend = %config.base_url,
        authenticated = identity.is_authenticated(),
        "starting NaurBot client"
    );

    let backend = HttpBackend::new(&config);
    let (session, handle) = SessionRuntime::new(identity.clone(), backend, download_dir);

    // Subscribe before spawning so the init snapshot is observed.
    let app = ChatApp::new(handle.clone(), handle.subscribe(), identity);
    tokio::spawn(session.run());

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal).await;
    ratatui::restore();

    result?;
    Ok(())
}
