use std::sync::Arc;

use client::{Error, Target};
use tracker::CountDown;


/// Terminal result of a connect attempt
#[derive(Debug)]
pub enum Outcome {
    /// Connection established, request execution takes over
    Connected,
    /// Attempt was dropped before it could complete (i.e. reactor has been
    /// shut down)
    Cancelled,
    /// Name resolution or connection failed
    Failed(Error),
    /// Attempt didn't complete within `Config::connect_timeout`
    TimedOut,
}

/// Receives the outcome of every connect attempt
///
/// Exactly one method is called per attempt.
pub trait AttemptCallback: Send + Sync {
    fn completed(&self, target: &Target);
    fn cancelled(&self, target: &Target);
    fn failed(&self, target: &Target, err: &Error);
    fn timed_out(&self, target: &Target);

    /// Dispatch outcome to one of the methods above
    fn report(&self, target: &Target, outcome: Outcome) {
        match outcome {
            Outcome::Connected => self.completed(target),
            Outcome::Cancelled => self.cancelled(target),
            Outcome::Failed(ref err) => self.failed(target, err),
            Outcome::TimedOut => self.timed_out(target),
        }
    }
}

/// Counts completion tracker down when connection could not be
/// established
///
/// Successful connections are counted down by the request execution
/// instead, so every target is counted exactly once.
#[derive(Debug, Clone)]
pub struct CountingCallback {
    tracker: Arc<CountDown>,
}

impl CountingCallback {
    pub fn new(tracker: &Arc<CountDown>) -> CountingCallback {
        CountingCallback {
            tracker: tracker.clone(),
        }
    }
}

impl AttemptCallback for CountingCallback {
    fn completed(&self, target: &Target) {
        debug!("Connect request completed: {}", target);
    }
    fn cancelled(&self, target: &Target) {
        info!("Connect request cancelled: {}", target);
        self.tracker.count_down();
    }
    fn failed(&self, target: &Target, err: &Error) {
        warn!("Connect request failed: {}: {}", target, err);
        self.tracker.count_down();
    }
    fn timed_out(&self, target: &Target) {
        warn!("Connect request timed out: {}", target);
        self.tracker.count_down();
    }
}
