//! Manual-reset wait handle

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A manual-reset event: once set, every wait returns immediately until it is
/// reset.
#[derive(Debug, Default)]
pub struct WaitHandle {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl WaitHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the handle and wake all waiters.
    pub fn set(&self) {
        let mut signaled = self.signaled.lock();
        *signaled = true;
        self.cond.notify_all();
    }

    pub fn reset(&self) {
        *self.signaled.lock() = false;
    }

    pub fn is_set(&self) -> bool {
        *self.signaled.lock()
    }

    /// Wait up to `timeout` for the handle to be set. Returns whether it is set.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signaled = self.signaled.lock();
        while !*signaled {
            if self.cond.wait_until(&mut signaled, deadline).timed_out() {
                break;
            }
        }
        *signaled
    }

    /// Wait without a timeout.
    pub fn wait_forever(&self) {
        let mut signaled = self.signaled.lock();
        while !*signaled {
            self.cond.wait(&mut signaled);
        }
    }
}
