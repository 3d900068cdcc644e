use std::sync::Arc;

use lead_capture_api::config::Config;
use lead_capture_api::handlers::AppState;
use lead_capture_api::notifications::SmtpNotifier;
use lead_capture_api::{db, routes};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, opens the document store, wires
/// the SMTP notifier and starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_capture_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    if config.admin_key.is_none() {
        tracing::warn!("⚠️  ADMIN_KEY not set: GET /api/leads is open to anyone");
    }
    if config.mail.is_none() {
        tracing::info!("SMTP not fully configured, lead notifications disabled");
    }

    // Open document store (falls back to an unavailable store on failure)
    let store = db::open_store(&config).await;

    let notifier = Arc::new(SmtpNotifier::new(config.mail.clone()));

    let app_state = Arc::new(AppState {
        config: config.clone(),
        store,
        notifier,
    });

    let app = routes::build_router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
