//! # Observability
//!
//! Process-level logging setup for audit-relay binaries.
//!
//! Libraries only use `tracing` macros; a binary calls [`init`] or
//! [`init_with_config`] once at startup to decide where the events go.
//!
//! - With [`LogConfig::log_path`] set, every event is appended to that file
//!   as a JSON line, and optionally echoed to stderr.
//! - Otherwise events go to stderr in the compact `fmt` format.
//!
//! `RUST_LOG` overrides [`LogConfig::default_level`] in both cases.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "audit-relay".into(),
//!         default_level: "debug".into(),
//!         ..Default::default()
//!     });
//!     tracing::info!("ready");
//! }
//! ```

mod file;
mod json_layer;

pub use file::CentralLogWriter;
pub use json_layer::{JsonLayer, LogLine};

use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written into every JSON line as `service`.
    pub service_name: String,

    /// Filter used when `RUST_LOG` is unset (e.g. "info", "audit_outbox=debug").
    pub default_level: String,

    /// JSONL file to append to. `None` logs to stderr only.
    pub log_path: Option<PathBuf>,

    /// Also echo to stderr when writing to a file.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// If the log file cannot be opened, logging falls back to stderr and the
/// failure is reported there. Calling this twice keeps the first subscriber.
pub fn init_with_config(config: LogConfig) {
    let Some(log_path) = config.log_path.clone() else {
        init_stderr(&config);
        return;
    };

    match init_file(&config, &log_path) {
        Ok(()) => {
            tracing::info!(log_path = %log_path.display(), "observability initialized");
        }
        Err(e) => {
            init_stderr(&config);
            tracing::warn!(
                log_path = %log_path.display(),
                error = %e,
                "Could not open log file, logging to stderr"
            );
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn init_stderr(config: &LogConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.default_level))
        .with_target(true)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

fn init_file(config: &LogConfig, log_path: &Path) -> io::Result<()> {
    let writer = CentralLogWriter::new(log_path)?;
    let json_layer = JsonLayer::new(config.service_name.clone(), writer);

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    let _ = tracing_subscriber::registry()
        .with(json_layer.with_filter(env_filter(&config.default_level)))
        .with(stderr_layer)
        .try_init();

    Ok(())
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};
