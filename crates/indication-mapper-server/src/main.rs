//! Indication mapper server binary.
//!
//! Reads configuration from the environment (and `.env` when present), opens
//! the mapping store and serves the REST API.

use anyhow::Context;
use indication_mapper_server::{app, build_state, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("indication_mapper=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("invalid configuration")?;
    let state = build_state(&config)?;

    tracing::info!(
        addr = %config.addr,
        database = %config.database_path,
        policy = state.core.policy_name(),
        "-- Starting indication mapper"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&config.addr).await?;
        axum::serve(listener, app(state)).await?;
        Ok::<(), anyhow::Error>(())
    })
}
