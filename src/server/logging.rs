//! Tracing subscriber setup

use super::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str =
    "mercato=info,mercato_core=info,mercato_gateway=info,mercato_store=info,tower_http=info";

/// Install the global subscriber.
///
/// The returned guard flushes the file writer and must be held for the
/// lifetime of the process.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let json = config.format.eq_ignore_ascii_case("json");

    let stdout = if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let (file, guard) = if config.directory.trim().is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(config.directory.trim(), "mercato.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = if json {
            fmt::layer().json().with_writer(writer).boxed()
        } else {
            fmt::layer().with_ansi(false).with_writer(writer).boxed()
        };
        (Some(layer), Some(guard))
    };

    // A second init (tests, `check` after `serve`) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init();
    guard
}
