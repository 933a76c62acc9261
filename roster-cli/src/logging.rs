use std::fs::File;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Install the process-wide subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("invalid log level '{}'", config.level))?,
    };

    let (writer, ansi) = match &config.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false);
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}
