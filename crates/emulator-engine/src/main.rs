//! Channel emulator binary.
//!
//! This is the main entry point that wires together configuration, the
//! storage backend, and the tick scheduler, then runs the tick loop until
//! Ctrl-C or the configured tick limit.
//!
//! # Startup Sequence
//!
//! 1. Read `emulator-config.yaml` (or the file named by `EMULATOR_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Fall back to the plain-text config files if there was no YAML file
//! 4. Validate the configuration
//! 5. Resolve the master seed and build the channels
//! 6. Connect the storage backend
//! 7. Install the Ctrl-C handler
//! 8. Run the tick loop
//! 9. Log the result and close storage

mod error;
mod sink;
mod tick_logger;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use emulator_core::channel::build_channels;
use emulator_core::config::{EmulatorConfig, LogFormat, LoggingConfig, StorageBackend};
use emulator_core::control::TickControl;
use emulator_core::scheduler::{self, TickScheduler};
use emulator_core::sink::{LogSink, StorageSink};
use emulator_db::{PgStorageSink, PostgresConfig, PostgresPool};
use emulator_types::ChannelKind;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::sink::EngineSink;
use crate::tick_logger::TickLogger;

/// Default configuration file name, relative to the working directory.
const DEFAULT_CONFIG_FILE: &str = "emulator-config.yaml";

/// Environment variable naming an alternative configuration file.
const CONFIG_PATH_ENV: &str = "EMULATOR_CONFIG";

/// Application entry point for the emulator.
///
/// # Errors
///
/// Returns an error if configuration is invalid or storage cannot be
/// reached. Storage failures during the tick loop are logged, not returned.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Read the YAML configuration, if present.
    let yaml_config = load_yaml_config()?;

    // 2. Initialize structured logging.
    let default_logging = LoggingConfig::default();
    init_logging(
        yaml_config
            .as_ref()
            .map_or(&default_logging, |config| &config.logging),
    );

    info!("emulator-engine starting");

    // 3. Fall back to the plain-text files.
    let config = match yaml_config {
        Some(config) => config,
        None => {
            info!("No YAML config found, reading plain-text config files");
            EmulatorConfig::from_legacy_dir(Path::new("."))?
        }
    };

    // 4. Validate.
    config.validate().map_err(EngineError::from)?;
    info!(
        period_ms = config.period_ms,
        max_ticks = config.max_ticks,
        channels = config.channels.len(),
        backend = config.storage.backend.name(),
        "Configuration loaded"
    );

    // 5. Build channels from the master seed.
    let master_seed = config.seed.unwrap_or_else(rand::random);
    info!(
        seed = master_seed,
        "Master seed (set `seed` in config to replay this run)"
    );
    let channels = build_channels(&config.channels, master_seed).map_err(EngineError::from)?;
    for channel in &channels {
        match channel.definition().kind {
            ChannelKind::Numeric(p) => info!(
                channel_id = %channel.id(),
                min = p.min,
                max = p.max,
                step = p.step,
                change_probability = p.change_probability,
                "Numeric channel"
            ),
            ChannelKind::Boolean(p) => info!(
                channel_id = %channel.id(),
                toggle_probability = p.toggle_probability,
                "Boolean channel"
            ),
        }
    }

    // 6. Connect storage.
    let sink = connect_sink(&config).await?;
    info!(sink = sink.name(), "Storage ready");

    // 7. Stop cleanly on Ctrl-C.
    let control = Arc::new(TickControl::new(config.max_ticks));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping after the current tick");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C"),
            }
        });
    }

    // 8. Run the tick loop.
    let mut scheduler =
        TickScheduler::new(channels, config.period(), sink).map_err(EngineError::from)?;
    let mut logger = TickLogger::new();
    let summary = scheduler.run(&control, &mut logger).await;

    // 9. Log results.
    scheduler::log_run_end(&summary);
    scheduler.sink().close().await;

    info!(
        end_reason = ?summary.end_reason,
        total_ticks = summary.total_ticks,
        persisted = logger.persisted(),
        failed = logger.failed(),
        elapsed_seconds = control.elapsed_seconds(),
        "emulator-engine shutdown complete"
    );

    Ok(())
}

/// Load `emulator-config.yaml` (or `$EMULATOR_CONFIG`) if it exists.
///
/// An explicitly named file must exist; the default file is optional.
fn load_yaml_config() -> Result<Option<EmulatorConfig>, EngineError> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let config = EmulatorConfig::from_file(&PathBuf::from(path))?;
        return Ok(Some(config));
    }
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        Ok(Some(EmulatorConfig::from_file(path)?))
    } else {
        Ok(None)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Build the configured storage backend.
async fn connect_sink(config: &EmulatorConfig) -> Result<EngineSink, EngineError> {
    match config.storage.backend {
        StorageBackend::Log => Ok(EngineSink::Log(LogSink::new())),
        StorageBackend::Postgres => {
            let pg_config = PostgresConfig::from_storage(&config.storage)?;
            let pool = PostgresPool::connect(&pg_config).await?;
            pool.run_migrations().await?;
            Ok(EngineSink::Postgres(PgStorageSink::new(pool)))
        }
    }
}
