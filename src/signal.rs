//! Ctrl+C handling for the polling loop.
//!
//! The sampler checks the flag once per tick and finishes the run with
//! whatever samples were collected; the handler never preempts a tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Shared cancellation flag, set from the SIGINT handler and polled by the
/// sampler between ticks.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Registers a SIGINT handler that sets the returned flag.
pub fn install_handler() -> Result<CancelFlag> {
    let cancel = CancelFlag::new();
    let handler = cancel.clone();
    ctrlc::set_handler(move || {
        handler.cancel();
    })
    .map_err(|e| Error::SignalHandler(e.to_string()))?;
    Ok(cancel)
}
