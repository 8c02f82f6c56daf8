use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("neither \"{0}\" nor \"{1}\" matches a running process")]
    NoProcessesResolvable(String, String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("sample for \"{label}\" at {at:?} is not newer than the previous sample at {last:?}")]
    NonMonotonicSample {
        label: String,
        at: Duration,
        last: Duration,
    },

    #[error("unsupported output format: {} (expected .svg or \"display\")", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("failed to write chart to {}: {source}", .path.display())]
    ChartWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("rendering failed: {0}")]
    Rendering(String),

    #[error("failed to install interrupt handler: {0}")]
    SignalHandler(String),
}

pub type Result<T> = std::result::Result<T, Error>;
