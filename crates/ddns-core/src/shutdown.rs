//! Cooperative shutdown
//!
//! The engine checks the token once per iteration, after the sleep. Nothing
//! is interrupted: an in-flight update or a pending sleep always completes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable stop flag shared between the signal listener and the engine
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    stop: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop; idempotent
    pub fn trigger(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}
