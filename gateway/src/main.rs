use anyhow::{Context, Result};
use debris_catalog::{loader, CatalogStats, DebrisRecord};
use orbital_mechanics::{LiveConfig, SamplingConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod live;
mod routes;

use config::GatewayConfig;
use live::LiveRegistry;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Vec<DebrisRecord>>,
    pub sampling: SamplingConfig,
    pub live_config: LiveConfig,
    pub live: Arc<LiveRegistry>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "debris_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env()?;

    let catalog = loader::load_catalog(&config.catalog_path)
        .with_context(|| format!("loading catalog {}", config.catalog_path.display()))?;
    let stats = CatalogStats::from_records(&catalog);
    tracing::info!(
        "   Catalog: {} objects ({} payloads, {} debris, {} with TLE)",
        stats.total,
        stats.payload,
        stats.debris,
        stats.with_tle
    );

    let state = AppState {
        catalog: Arc::new(catalog),
        sampling: SamplingConfig::default(),
        live_config: config.live,
        live: Arc::new(LiveRegistry::new(config.limits)),
    };
    let live = state.live.clone();

    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Debris Gateway starting on {}", addr);
    tracing::info!(
        "   Live sessions: {} ms ticks, {} ms simulated per tick, up to {} objects",
        config.live.tick_interval_ms,
        config.live.sim_step_ms,
        config.live.max_objects
    );
    tracing::info!(
        "   Live limits: {} sessions, {} s idle timeout",
        config.limits.max_sessions,
        config.limits.idle_timeout.as_secs()
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
        })
        .await?;

    live.stop_all().await;
    tracing::info!("All live sessions stopped");

    Ok(())
}
