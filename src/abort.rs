//! Cooperative cancellation for tree builds.
//!
//! An [`AbortController`] hands out [`AbortSignal`]s that share one flag.
//! The builder polls the signal before every node visit; listeners may
//! hold a controller clone and abort from inside a callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Owner side of an abort flag.
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    flag: Arc<AtomicBool>,
}

/// Read side of an abort flag.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    flag: Arc<AtomicBool>,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal observing this controller.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            flag: Arc::clone(&self.flag),
        }
    }

    /// Request cancellation. Calling this more than once has no further effect.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl AbortSignal {
    /// A signal that is never aborted.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
