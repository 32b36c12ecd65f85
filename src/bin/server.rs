//! Citizen Dashboard server binary

use anyhow::{Context, Result};
use citizen_dashboard::api::{create_router, ApiState};
use citizen_dashboard::provider::WatsonxCompleter;
use citizen_dashboard::{DashboardConfig, WatsonxCredentials};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Citizen Dashboard v{}", env!("CARGO_PKG_VERSION"));

    // Load config from file, falling back to compiled defaults
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config: DashboardConfig = if std::path::Path::new(&config_path).exists() {
        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path))?
    } else {
        DashboardConfig::default()
    };

    // Credentials come from the environment and are checked before the
    // router exists: a missing credential must never leave a panel reachable.
    let credentials = WatsonxCredentials::from_env()
        .context("Cannot start without watsonx credentials")?;

    info!(
        endpoint = %credentials.endpoint_url,
        insights_model = %config.models.insights,
        services_model = %config.models.services,
        "Loaded configuration"
    );

    let completer = Arc::new(WatsonxCompleter::new(credentials, config.models.clone()));

    let state = Arc::new(ApiState { completer });

    let app = create_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.listen_addr))?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
