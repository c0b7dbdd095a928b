use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{app, AppState};
use rxstatus_core::constants::{DEFAULT_ADDR, ENV_ADDR};
use rxstatus_core::{build_store, CoreConfig, RecordService, StoreKind};

/// Main entry point for the RxStatus web front end
///
/// Resolves configuration once, builds the record store it selects, and serves the record
/// table plus the JSON API on a single listener.
///
/// # Environment Variables
/// - `RXSTATUS_ADDR`: listen address (default: "0.0.0.0:5000")
/// - `RXSTATUS_STORE`: `airtable` (default) or `memory`
/// - `AIRTABLE_ACCESS_TOKEN`, `AIRTABLE_BASE_ID`, `AIRTABLE_TABLE_NAME`: backend settings
/// - `AIRTABLE_API_URL`, `AIRTABLE_TIMEOUT_SECS`: backend origin and request timeout
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration is invalid or the listener fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rxstatus_run=info".parse()?)
                .add_directive("rxstatus_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::from_env()?;
    if cfg.store_kind() == StoreKind::Airtable {
        let missing = cfg.airtable().missing_settings();
        if !missing.is_empty() {
            tracing::warn!(
                "Airtable settings not set: {}. Requests to the backend will fail.",
                missing.join(", ")
            );
        }
    }

    let addr: SocketAddr = std::env::var(ENV_ADDR)
        .unwrap_or_else(|_| DEFAULT_ADDR.into())
        .parse()?;

    tracing::info!("++ Starting RxStatus on {} ({:?} store)", addr, cfg.store_kind());

    let records = RecordService::new(build_store(&cfg));
    let router = app(AppState::new(records));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
