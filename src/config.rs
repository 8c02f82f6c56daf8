use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Parameters that bound a sampling run. Built once at startup and passed
/// explicitly into the sampler; there is no ambient default.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub interval: Duration,
    pub max_duration: Option<Duration>,
    pub max_samples: Option<usize>,
}

impl RunConfig {
    /// Validates the raw CLI values. Rejects anything that would make the
    /// polling loop meaningless before it starts.
    pub fn new(
        interval_secs: f64,
        max_duration_secs: Option<f64>,
        max_samples: Option<usize>,
    ) -> Result<Self> {
        if !interval_secs.is_finite() || interval_secs <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "interval must be a positive number of seconds, got {interval_secs}"
            )));
        }
        if let Some(d) = max_duration_secs {
            if !d.is_finite() || d <= 0.0 {
                return Err(Error::InvalidConfiguration(format!(
                    "duration must be a positive number of seconds, got {d}"
                )));
            }
        }
        if max_samples == Some(0) {
            return Err(Error::InvalidConfiguration(
                "sample limit must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            interval: Duration::from_secs_f64(interval_secs),
            max_duration: max_duration_secs.map(Duration::from_secs_f64),
            max_samples,
        })
    }
}

/// Where the rendered chart goes. `Display` opens an interactive window,
/// `File` writes an image whose format is picked from the extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Display,
    File(PathBuf),
}

impl OutputTarget {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("display") {
            OutputTarget::Display
        } else {
            OutputTarget::File(PathBuf::from(raw))
        }
    }
}
