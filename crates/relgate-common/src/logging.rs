//! ---
//! rg_section: "01-core-functionality"
//! rg_subsection: "module"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Shared primitives and utilities for the reliability gate."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use anyhow::Result;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

const LOG_ENV: &str = "RELGATE_LOG";

static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();
static CONSOLE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// Available console log formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    StructuredJson,
    Pretty,
}

/// Initialize the tracing subscriber based on configuration and environment variables.
///
/// * `RELGATE_LOG` overrides the log filter (e.g. `info`, `debug,relgate_sim=trace`).
///   When unset the standard `RUST_LOG` variable is honoured, finally defaulting to `info`.
/// * Console output goes to stderr so stdout stays reserved for the gate verdict that CI
///   pipelines capture. A rolling daily JSON file is written under the configured directory.
pub fn init_tracing(service_name: &str, config: &LoggingConfig) -> Result<()> {
    std::fs::create_dir_all(&config.directory)?;
    let prefix = config
        .file_prefix
        .clone()
        .unwrap_or_else(|| service_name.to_owned());

    let file_appender = daily(
        &config.directory,
        format!("{}-{}.log", prefix, service_name),
    );
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let (console_writer, console_guard) = tracing_appender::non_blocking(std::io::stderr());

    let _ = FILE_GUARD.set(file_guard);
    let _ = CONSOLE_GUARD.set(console_guard);

    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(directive).unwrap_or_else(|err| {
            eprintln!(
                "invalid {} directive ({}); defaulting to info logging",
                LOG_ENV, err
            );
            EnvFilter::new("info")
        }),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let console_layer = match config.format {
        LogFormat::StructuredJson => fmt::layer()
            .with_target(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .json()
            .with_writer(console_writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(console_writer)
            .boxed(),
    };

    let file_layer = fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .json()
        .with_writer(file_writer)
        .boxed();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .ok();

    info!(service = %service_name, log_dir = %config.directory.display(), format = ?config.format, "tracing initialised");
    Ok(())
}
