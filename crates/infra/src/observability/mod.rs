//! Process-wide logging setup
//!
//! Reporting code logs through `tracing` macros only; binaries call
//! [`init_logging`] once at startup to decide where those events go.

use faultline_domain::{FaultlineError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Level used when `RUST_LOG` is not set
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human readable output
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// JSON in release builds, compact otherwise
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Compact
        } else {
            Self::Json
        }
    }
}

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to [`DEFAULT_LOG_LEVEL`].
///
/// # Errors
/// Returns `FaultlineError::Internal` when a global subscriber is already
/// installed.
pub fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let builder = fmt::fmt().with_env_filter(env_filter).with_thread_ids(false);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|err| {
        FaultlineError::Internal(format!("failed to install tracing subscriber: {err}"))
    })
}
