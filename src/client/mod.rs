//! The HTTP/1.x batch client implementation
//!
//! The entry point is `Client`: it takes a list of targets, runs a request
//! to each of them on a small pool of reactor threads and blocks until
//! every connection is either completed or abandoned.
//!
mod batch;
mod buffered;
mod callback;
mod codec;
mod config;
mod connection;
mod context;
mod encoder;
mod errors;
mod execution;
mod head;
mod observer;
mod parser;
mod proto;
mod reactor;
mod request;
mod target;
pub mod interceptor;

pub use self::batch::Client;
pub use self::buffered::Response;
pub use self::callback::{AttemptCallback, CountingCallback, Outcome};
pub use self::codec::Codec;
pub use self::connection::Submission;
pub use self::context::{Context, RequestState};
pub use self::errors::Error;
pub use self::execution::{Execution, ResponseHandler, LogResponse};
pub use self::interceptor::{Interceptor, Processor};
pub use self::observer::{EventObserver, EventLogger};
pub use self::reactor::{Reactor, Status};
pub use self::request::Request;
pub use self::target::Target;

use std::sync::Arc;
use std::time::Duration;

use httparse::Header;

use version::Version;

/// Fine-grained configuration of the client
#[derive(Clone)]
pub struct Config {
    socket_timeout: Duration,
    connect_timeout: Duration,
    socket_buffer_size: usize,
    stale_connection_check: bool,
    tcp_nodelay: bool,
    user_agent: String,
    keep_alive: bool,
    expect_continue: bool,
    version: Version,
    max_response_length: usize,
    workers: usize,
    observer: Option<Arc<EventObserver>>,
}

/// A borrowed structure that represents response headers
///
/// It's passed to `Codec::headers_received` and you are free to store or
/// discard any needed fields and headers from it.
///
#[derive(Debug)]
pub struct Head<'a> {
    version: Version,
    code: u16,
    reason: &'a str,
    headers: &'a [Header<'a>],
    connection_close: bool,
}
