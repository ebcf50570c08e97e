use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "QUILL_LOG";
const DEFAULT_FILTER: &str = "quill=info";

/// Keeps the background log writer alive; dropping it flushes the file.
pub struct Guard(#[allow(dead_code)] WorkerGuard);

/// Sends human-readable logs to stderr and JSON logs to a daily file in
/// `log_dir`. The filter comes from `QUILL_LOG`.
pub fn init_tracing(log_dir: &Path) -> anyhow::Result<Guard> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("quill")
        .filename_suffix("log")
        .build(log_dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()?;

    Ok(Guard(guard))
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
