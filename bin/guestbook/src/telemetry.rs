//! Diagnostic logging: console plus `<log dir>/log.txt`.

use anyhow::Context;
use gb_config::{LogFormat, LogSettings};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE: &str = "log.txt";

/// Installs the global subscriber. Keep the returned guard alive for the
/// life of the process or buffered file lines are lost.
pub fn init(log: &LogSettings) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&log.dir)
        .with_context(|| format!("creating log directory {}", log.dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log.dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .with_context(|| format!("invalid log level {:?}", log.level))?;

    let pretty = (log.format == LogFormat::Pretty).then(|| fmt::layer().with_target(false));
    let json = (log.format == LogFormat::Json).then(|| fmt::layer().json());

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(guard)
}
