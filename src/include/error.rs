//! Per-marker failure reasons.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Why a single marker could not be resolved.
///
/// Never escapes the engine: each one is rendered into an inline error
/// element and recorded in the report.
#[derive(Debug, Error)]
pub enum IncludeError {
    #[error("empty include directive")]
    EmptyDirective,

    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    /// Non-2xx response, or a missing file for local sources.
    #[error("{code} {reason}")]
    Status { code: u16, reason: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is outside the site root")]
    OutsideRoot(String),

    #[error("include pass limit ({0}) exceeded, possible include cycle")]
    PassLimit(usize),
}

impl IncludeError {
    pub fn not_found() -> Self {
        Self::Status {
            code: 404,
            reason: "Not Found".into(),
        }
    }
}
