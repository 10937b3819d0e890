//! Shared target state written from outside the tick loop.
//!
//! The command interpreter and the button gesture layer run in other
//! execution contexts than the motion tick (serial thread, button poller).
//! All cross-context traffic goes through single-word atomics here; there
//! are no multi-field transactions for a reader to observe half-written.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Cloneable handle to the target position and the pending re-home request.
///
/// Every producer performs plain load/store pairs; a jog that races an
/// absolute set resolves to whichever store lands last, matching the
/// original single-word firmware semantics.
#[derive(Debug, Clone)]
pub struct TargetHandle {
    inner: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    target: AtomicI32,
    rehome: AtomicBool,
}

impl TargetHandle {
    pub fn new(initial: i32) -> Self {
        Self {
            inner: Arc::new(Shared {
                target: AtomicI32::new(initial),
                rehome: AtomicBool::new(false),
            }),
        }
    }

    /// Current target position in steps.
    #[inline]
    pub fn get(&self) -> i32 {
        self.inner.target.load(Ordering::Relaxed)
    }

    /// Replace the target position.
    #[inline]
    pub fn set(&self, steps: i32) {
        self.inner.target.store(steps, Ordering::Relaxed);
    }

    /// Ask the motion controller to re-enter the homing sequence on its
    /// next tick. Does not reset the position and does not arrest a move
    /// already in progress.
    #[inline]
    pub fn request_rehome(&self) {
        self.inner.rehome.store(true, Ordering::Relaxed);
    }

    /// Consume a pending re-home request, if any.
    #[inline]
    pub fn take_rehome(&self) -> bool {
        self.inner.rehome.swap(false, Ordering::Relaxed)
    }
}

impl Default for TargetHandle {
    fn default() -> Self {
        Self::new(0)
    }
}
