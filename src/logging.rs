//! `tracing` subscriber setup.

use std::ffi::OsStr;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::Result;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the configured level. Console output uses the
/// configured format; the optional log file always gets JSON lines. Keep the
/// returned guard alive for as long as the file should be written: dropping
/// it flushes and stops the background writer.
///
/// Fails with [`Error::Logging`](crate::Error::Logging) when a global
/// subscriber is already set; the new one is then discarded.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let (layers, guard) = layers(config);
    tracing_subscriber::registry().with(layers).with(filter).try_init()?;
    Ok(guard)
}

fn layers(config: &LoggingConfig) -> (Vec<BoxedLayer>, Option<WorkerGuard>) {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.enable_console {
        layers.push(console_layer(config.format));
    }

    let mut guard = None;
    if let Some(path) = &config.file_path {
        let path = Path::new(path);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let file = path.file_name().unwrap_or(OsStr::new("booksapi.log"));
        let (writer, worker) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_current_span(true)
                .with_writer(writer)
                .boxed(),
        );
        guard = Some(worker);
    }
    (layers, guard)
}

fn console_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Default => fmt::layer().boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    }
}
