//! Ctrl-C handling
//!
//! SIGINT never terminates podrig. The handler only raises a shared flag;
//! blocking reads and attached commands check it when they return and turn
//! it into a normal "go back" or [`PodrigError::Cancelled`] result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{PodrigError, Result};

/// Shared interrupt flag
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    raised: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route SIGINT to this flag for the rest of the process
    pub fn install(&self) -> Result<()> {
        let raised = Arc::clone(&self.raised);
        ctrlc::set_handler(move || raised.store(true, Ordering::SeqCst))
            .map_err(|e| PodrigError::TerminalInput(format!("cannot install Ctrl-C handler: {}", e)))
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Clear the flag, returning whether it was set
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::SeqCst)
    }
}
