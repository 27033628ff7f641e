//! # Flock Server
//!
//! A social network backend (tweets, comments, chat rooms) implemented in
//! Rust.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool
//! - SMTP mailer
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use flock_server::config::Settings;
use flock_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    flock_server::telemetry::init_tracing();

    info!("Starting Flock Server...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
