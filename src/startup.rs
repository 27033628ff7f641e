//! Application Startup
//!
//! The composition root: builds the pool, mailer, gateway, and router with
//! explicit construction, then binds the listener.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::config::Settings;
use crate::infrastructure::database;
use crate::infrastructure::email::SmtpMailer;
use crate::presentation::http::routes;
use crate::presentation::middleware::cors;
use crate::presentation::websocket::Gateway;
use crate::shared::snowflake::SnowflakeGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub mailer: Arc<SmtpMailer>,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub gateway: Arc<Gateway>,
    pub settings: Arc<Settings>,
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        // Run pending migrations
        database::run_migrations(&db).await?;
        tracing::info!("Database migrations applied");

        // Create SMTP mailer
        let mailer = Arc::new(SmtpMailer::new(&settings.smtp).map_err(|e| anyhow::anyhow!("{e}"))?);

        // Create snowflake generator
        let snowflake = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id as u64,
            0u64,
        ));

        // Create WebSocket gateway registry
        let gateway = Arc::new(Gateway::new());

        // Create app state
        let state = AppState {
            db,
            mailer,
            snowflake,
            gateway,
            settings: Arc::new(settings.clone()),
        };

        // Build router with middleware
        let router = routes::create_router(state).layer(cors::create_cors_layer(&settings.cors));

        // Bind to address
        let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
