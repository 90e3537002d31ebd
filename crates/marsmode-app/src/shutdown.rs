//! Cooperative shutdown flag.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared stop request, observed by the delivery loop between iterations.
///
/// Cloning yields a handle to the same flag, so a signal handler thread can
/// hold one clone while the loop holds another.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// New, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop before its next iteration.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
