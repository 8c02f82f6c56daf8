#![warn(clippy::all, rust_2018_idioms)]

pub mod chart;
pub mod config;
pub mod error;
pub mod metrics;
pub mod signal;

pub use config::{OutputTarget, RunConfig};
pub use error::{Error, Result};
