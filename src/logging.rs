//! Tracing setup driven by [`StoreConfig`].
//!
//! The filter comes from `log_level` when configured, otherwise from
//! `RUST_LOG`, otherwise a build-dependent default. Events always go to
//! stderr, and also as JSON lines to `log_file` when one is set.

use crate::config::StoreConfig;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::IsTerminal;
use std::sync::{Mutex, Once};
use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = if cfg!(debug_assertions) {
    "taskdeck=debug"
} else {
    "taskdeck=info"
};

fn env_filter(config: &StoreConfig) -> Result<EnvFilter> {
    if let Some(level) = &config.log_level {
        return EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'"));
    }
    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
}

/// Build the subscriber described by `config` without installing it.
///
/// # Errors
///
/// Returns an error if `log_level` is not a valid filter directive or the
/// log file cannot be created.
pub fn build_subscriber(config: &StoreConfig) -> Result<impl Subscriber + Send + Sync + 'static> {
    let filter = env_filter(config)?;

    let json_layer = match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .json(),
            )
        }
        None => None,
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(cfg!(debug_assertions))
        .with_line_number(cfg!(debug_assertions))
        .with_ansi(std::io::stderr().is_terminal());

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(json_layer))
}

/// Install the subscriber described by `config` as the global default.
///
/// # Errors
///
/// Returns an error if the subscriber cannot be built or a global
/// subscriber is already installed.
pub fn init_logging(config: &StoreConfig) -> Result<()> {
    let subscriber = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber)
        .context("a global tracing subscriber is already installed")
}

/// Initialize logging for tests with the test writer.
pub fn init_test_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("taskdeck=debug,test=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}
