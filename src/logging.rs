use crate::models::LoggingSettings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter for the configured verbosity.
fn env_filter(debug_mode: bool) -> EnvFilter {
    if debug_mode {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Resolve the log directory against `base_dir` and create it.
///
/// Absolute directories are used as-is.
pub fn prepare_log_dir(base_dir: &Utf8Path, log_dir: &str) -> Result<Utf8PathBuf> {
    let log_path = Utf8Path::new(log_dir);
    let log_path = if log_path.is_absolute() {
        log_path.to_path_buf()
    } else {
        base_dir.join(log_path)
    };

    if !log_path.exists() {
        fs::create_dir_all(&log_path)
            .with_context(|| format!("Failed to create log directory: {}", log_path))?;
    }
    Ok(log_path)
}

/// Setup logging with a daily rotating file and optional console output.
///
/// # Arguments
/// * `base_dir` - Directory a relative `Log Dir` is resolved against (the config directory)
/// * `settings` - Logging section of `DLC Manager.yaml`
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(base_dir: &Utf8Path, settings: &LoggingSettings) -> Result<WorkerGuard> {
    let log_dir = prepare_log_dir(base_dir, &settings.log_dir)?;

    let file_appender = rolling::daily(&log_dir, &settings.log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // Option<Layer> is itself a layer, so the console layer can be switched off
    let console_layer = settings.console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(settings.debug_mode))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}",
        log_dir,
        settings.log_prefix,
        settings.debug_mode,
        settings.console_output
    );

    Ok(guard)
}
