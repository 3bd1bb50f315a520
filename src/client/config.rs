use std::cmp::max;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use client::{Config, EventObserver};
use version::Version;


impl Config {
    /// Create a config with defaults
    pub fn new() -> Config {
        Config {
            socket_timeout: Duration::from_millis(5000),
            connect_timeout: Duration::from_millis(10000),
            socket_buffer_size: 8 << 10,
            stale_connection_check: false,
            tcp_nodelay: true,
            user_agent: concat!("tk-reactor/",
                                env!("CARGO_PKG_VERSION")).to_string(),
            keep_alive: true,
            expect_continue: false,
            version: Version::Http11,
            max_response_length: 10_485_760,
            workers: 2,
            observer: None,
        }
    }
    /// Maximum time connection may be idle (nothing read and nothing
    /// written) before it's closed
    pub fn socket_timeout(&mut self, value: Duration) -> &mut Self {
        self.socket_timeout = value;
        self
    }
    /// Time limit for resolving a name and establishing a connection
    pub fn connect_timeout(&mut self, value: Duration) -> &mut Self {
        self.connect_timeout = value;
        self
    }
    /// Size of kernel send and receive buffers of every socket
    pub fn socket_buffer_size(&mut self, value: usize) -> &mut Self {
        self.socket_buffer_size = value;
        self
    }
    /// Check that connection has not been closed by peer before writing
    /// a request into it
    pub fn stale_connection_check(&mut self, value: bool) -> &mut Self {
        self.stale_connection_check = value;
        self
    }
    /// Set `TCP_NODELAY` on every socket
    pub fn tcp_nodelay(&mut self, value: bool) -> &mut Self {
        self.tcp_nodelay = value;
        self
    }
    /// Value of `User-Agent` header, empty string means no header
    pub fn user_agent(&mut self, value: &str) -> &mut Self {
        self.user_agent = value.to_string();
        self
    }
    /// Connection reuse policy: `Connection: Keep-Alive` when enabled and
    /// `Connection: close` otherwise
    pub fn keep_alive(&mut self, value: bool) -> &mut Self {
        self.keep_alive = value;
        self
    }
    /// Send `Expect: 100-continue` with requests that have a body
    pub fn expect_continue(&mut self, value: bool) -> &mut Self {
        self.expect_continue = value;
        self
    }
    /// HTTP version of requests
    pub fn version(&mut self, value: Version) -> &mut Self {
        self.version = value;
        self
    }
    /// Maximum size of the response body, longer responses are considered
    /// failed
    pub fn max_response_length(&mut self, value: usize) -> &mut Self {
        self.max_response_length = value;
        self
    }
    /// Number of reactor threads, zero is treated as one
    pub fn workers(&mut self, value: usize) -> &mut Self {
        self.workers = max(value, 1);
        self
    }
    /// Observer notified about connection lifecycle events
    pub fn observer<O: EventObserver + 'static>(&mut self, value: O)
        -> &mut Self
    {
        self.observer = Some(Arc::new(value));
        self
    }
    /// Create a Arc'd config clone to pass to the constructor
    ///
    /// This is just a convenience method.
    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("socket_timeout", &self.socket_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("socket_buffer_size", &self.socket_buffer_size)
            .field("stale_connection_check", &self.stale_connection_check)
            .field("tcp_nodelay", &self.tcp_nodelay)
            .field("user_agent", &self.user_agent)
            .field("keep_alive", &self.keep_alive)
            .field("expect_continue", &self.expect_continue)
            .field("version", &self.version)
            .field("max_response_length", &self.max_response_length)
            .field("workers", &self.workers)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;
    use super::Config;

    #[test]
    fn defaults() {
        let cfg = Config::new();
        assert_eq!(cfg.socket_timeout, Duration::from_millis(5000));
        assert_eq!(cfg.connect_timeout, Duration::from_millis(10000));
        assert_eq!(cfg.socket_buffer_size, 8192);
        assert!(!cfg.stale_connection_check);
        assert!(cfg.tcp_nodelay);
        assert!(cfg.user_agent.starts_with("tk-reactor/"));
        assert_eq!(cfg.workers, 2);
        assert!(cfg.observer.is_none());
    }

    #[test]
    fn zero_workers() {
        let mut cfg = Config::new();
        cfg.workers(0);
        assert_eq!(cfg.workers, 1);
        cfg.workers(4);
        assert_eq!(cfg.workers, 4);
    }
}
