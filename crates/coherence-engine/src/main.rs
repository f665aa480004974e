//! Field engine binary.
//!
//! Loads configuration, manifests the shared field, seeds participants,
//! starts the heartbeat and the configured emitters, then logs status
//! until Ctrl-C or the configured wall-clock bound.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `coherence-config.yaml` (or `COHERENCE_CONFIG`)
//! 3. Manifest the field context
//! 4. Integrate seed participants and start their attunement
//! 5. Start the heartbeat
//! 6. Start the configured emitters
//! 7. Log status until shutdown
//! 8. Stop every emitter and log the final reports

mod error;
mod seeder;
mod status;

use std::path::{Path, PathBuf};

use coherence_core::config::CoreConfig;
use coherence_core::emitters::register_configured;
use coherence_core::{EmitterExit, EmitterGroup, FieldContext, Heartbeat, Schedule};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Environment variable overriding the config file path.
const CONFIG_ENV: &str = "COHERENCE_CONFIG";

/// Default config file path, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "coherence-config.yaml";

/// Application entry point for the field engine.
///
/// # Errors
///
/// Returns an error if configuration is invalid, an emitter cannot be
/// scheduled, or the shutdown signal cannot be installed.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("coherence-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        name = config.world.name.as_str(),
        seed = config.world.seed,
        participants = config.participants.len(),
        emitters = config.emitters.len(),
        levels = config.evolution.levels.len(),
        "Configuration loaded"
    );

    // 3. Manifest the field.
    let ctx = FieldContext::from_config(&config).map_err(EngineError::from)?;

    // 4. Seed participants.
    let mut group = EmitterGroup::new();
    seeder::seed_participants(&ctx, &config, &mut group)?;

    // 5. Heartbeat.
    if config.heartbeat.enabled {
        let handle = ctx
            .register_emitter(Schedule::every_ms(config.heartbeat.period_ms), Heartbeat::new())
            .map_err(EngineError::from)?;
        group.push(handle);
        info!(period_ms = config.heartbeat.period_ms, "Heartbeat started");
    }

    // 6. Configured emitters.
    match register_configured(&ctx, &config.emitters) {
        Ok(configured) => group.extend(configured),
        Err(err) => {
            group.stop_all();
            group.join_all().await;
            return Err(EngineError::from(err).into());
        }
    }
    info!(emitters = group.len(), "Emitters running");

    // 7. Status loop.
    let reason = status::run_until_shutdown(&ctx, &config.bounds).await?;
    info!(reason = %reason, "Shutting down");

    // 8. Stop and report.
    group.stop_all();
    let reports = group.join_all().await;
    for report in &reports {
        match &report.exit {
            EmitterExit::Faulted { reason } => warn!(
                emitter_id = %report.id,
                name = report.name.as_str(),
                ticks = report.ticks,
                reason = reason.as_str(),
                "Emitter had faulted"
            ),
            exit => info!(
                emitter_id = %report.id,
                name = report.name.as_str(),
                ticks = report.ticks,
                exit = ?exit,
                "Emitter report"
            ),
        }
    }

    status::log_final(&ctx);
    Ok(())
}

/// Resolve the config path from the environment or the default.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration from disk, falling back to defaults.
fn load_config() -> Result<CoreConfig, EngineError> {
    let path = config_path();
    let config = read_config(&path)?;
    config.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<CoreConfig, EngineError> {
    if path.exists() {
        info!(path = %path.display(), "Loading configuration");
        Ok(CoreConfig::from_file(path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(CoreConfig::default())
    }
}
