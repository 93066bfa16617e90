//! # Indication Mapper REST API
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Configuration from the environment
//! - The DailyMed label source
//! - Mapping of domain errors to status codes and `{"error"}` bodies
//!
//! Blocking work (SQLite, blocking HTTP clients) runs on the blocking pool.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod dailymed;
pub mod error;
pub mod routes;

pub use config::ServerConfig;
pub use dailymed::DailyMedClient;
pub use error::ApiError;
pub use routes::{app, AppState};

use std::sync::Arc;

use indication_mapper_core::MapperCore;
use indication_mapper_llm::{OllamaClient, ProgramInference, TextGenerator};

/// Build the production state from a validated configuration.
///
/// Must be called outside the async runtime: the blocking HTTP clients own
/// their own runtimes.
pub fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let labels = Arc::new(DailyMedClient::new(
        &config.dailymed_base_url,
        config.upstream_timeout,
    )?);
    let generator: Arc<dyn TextGenerator> = Arc::new(OllamaClient::new(
        &config.ollama_base_url,
        config.upstream_timeout,
    )?);
    let programs = Arc::new(ProgramInference::new(
        generator.clone(),
        &config.ollama_model,
        config.program_data_dir.clone(),
    ));

    let core = MapperCore::open(
        &config.database_path,
        config.match_policy,
        labels,
        programs.clone(),
    )?;

    Ok(AppState {
        core: Arc::new(core),
        programs,
        generator,
    })
}
