use std::io;

use client::{Error, Target};


/// Receives notifications about connection lifecycle
///
/// This is a read-only side channel: nothing returned from here affects
/// the request execution. All methods are no-op by default. They are
/// called on the reactor threads, so they should not block.
pub trait EventObserver: Send + Sync {
    /// Connection to the target is established
    fn connection_open(&self, _target: &Target) {}
    /// Connection was idle for longer than `Config::socket_timeout`
    fn connection_timeout(&self, _target: &Target) {}
    /// Established connection is closed for any reason
    fn connection_closed(&self, _target: &Target) {}
    /// Established connection failed with I/O error
    fn fatal_io_error(&self, _err: &io::Error, _target: &Target) {}
    /// Peer broke the HTTP protocol or request can't be serialized
    fn fatal_protocol_error(&self, _err: &Error, _target: &Target) {}
}

/// Observer that logs every event
#[derive(Debug, Clone, Copy)]
pub struct EventLogger;

impl EventObserver for EventLogger {
    fn connection_open(&self, target: &Target) {
        info!("Connection open: {}", target);
    }
    fn connection_timeout(&self, target: &Target) {
        info!("Connection timed out: {}", target);
    }
    fn connection_closed(&self, target: &Target) {
        info!("Connection closed: {}", target);
    }
    fn fatal_io_error(&self, err: &io::Error, target: &Target) {
        error!("Fatal I/O error on {}: {}", target, err);
    }
    fn fatal_protocol_error(&self, err: &Error, target: &Target) {
        error!("HTTP error on {}: {}", target, err);
    }
}
