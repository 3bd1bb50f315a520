//! Completion tracker shared by all connections of a batch
//!
//! This is a countdown latch: it's created with the number of connections
//! in the batch, every connection counts it down exactly once when it
//! reaches a terminal state, and the thread that submitted the batch
//! waits for it to reach zero.
use std::sync::{Mutex, MutexGuard, Condvar, PoisonError};
use std::time::{Duration, Instant};


/// A thread-safe countdown that releases waiters when it reaches zero
#[derive(Debug)]
pub struct CountDown {
    remaining: Mutex<usize>,
    zero: Condvar,
}

impl CountDown {
    /// Create a counter at `count`
    ///
    /// A counter created at zero never blocks.
    pub fn new(count: usize) -> CountDown {
        CountDown {
            remaining: Mutex::new(count),
            zero: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<usize> {
        // Nothing can leave the counter in an inconsistent state
        self.remaining.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of connections not yet completed
    pub fn count(&self) -> usize {
        *self.lock()
    }

    /// Reduce the counter by one, waking up waiters when it reaches zero
    ///
    /// Extra decrements past zero are ignored.
    pub fn count_down(&self) {
        let mut remaining = self.lock();
        match *remaining {
            0 => {
                warn!("Completion tracker is counted down past zero");
            }
            1 => {
                *remaining = 0;
                self.zero.notify_all();
            }
            _ => *remaining -= 1,
        }
    }

    /// Block the current thread until the counter reaches zero
    ///
    /// Note: there is no deadline here, if some connection never reports
    /// its completion this blocks forever. Use `wait_timeout` if it's
    /// an issue.
    pub fn wait(&self) {
        let mut remaining = self.lock();
        while *remaining > 0 {
            remaining = self.zero.wait(remaining)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Same as `wait()` but gives up after `timeout`
    ///
    /// Returns `true` if counter has reached zero.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut remaining = self.lock();
        while *remaining > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            remaining = self.zero.wait_timeout(remaining, deadline - now)
                .unwrap_or_else(PoisonError::into_inner).0;
        }
        true
    }
}
