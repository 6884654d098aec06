//! Run-scoped diagnostics sink
//!
//! A [`Diagnostics`] value routes `tracing` events emitted during a run to
//! stderr and, optionally, to an append-only log file. It is installed as the
//! thread's default dispatcher while alive; dropping it flushes and closes the
//! log file.

use std::fs::OpenOptions;
use std::path::Path;
use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use crate::error::RunError;

pub struct Diagnostics {
    // Field order matters: detach the dispatcher before flushing the writer.
    _dispatch: DefaultGuard,
    _writer: Option<WorkerGuard>,
}

impl Diagnostics {
    /// Open the sink. `log_file` is created if missing and appended to.
    pub fn open(log_file: Option<&Path>, filter: &str) -> Result<Self, RunError> {
        let (file_writer, writer_guard) = match log_file {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|source| RunError::LogFile {
                        path: path.to_path_buf(),
                        source,
                    })?;
                }

                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| RunError::LogFile {
                        path: path.to_path_buf(),
                        source,
                    })?;

                let (writer, guard) = tracing_appender::non_blocking(file);
                (Some(writer), Some(guard))
            }
            None => (None, None),
        };

        let file_layer = file_writer.map(|writer| {
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
        });

        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new(filter))
            .with(file_layer)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            );

        Ok(Self {
            _dispatch: tracing::subscriber::set_default(subscriber),
            _writer: writer_guard,
        })
    }
}
