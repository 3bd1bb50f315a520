//! Concurrent batch HTTP/1.x client based on `tokio` tools
//!
//! Give it a list of urls, it makes a single `GET` request to each of
//! them on a small pool of event loop threads and blocks until every
//! url either got its response or failed.
//!
//! ```rust,no_run
//! extern crate tk_reactor;
//!
//! use tk_reactor::client::{Client, Config};
//!
//! # fn main() {
//! let client = Client::new(&Config::new().done());
//! client.fetch_urls(&["http://example.com/", "http://example.org/"]);
//! # }
//! ```
#![recursion_limit="100"]

extern crate futures;
extern crate futures_cpupool;
extern crate httparse;
extern crate netbuf;
extern crate tk_bufstream;
extern crate tokio_core;
extern crate tokio_io;
extern crate url;
#[macro_use(quick_error)] extern crate quick_error;
#[macro_use] extern crate matches;
#[macro_use] extern crate log;


pub mod client;
pub mod tracker;
mod body_parser;
mod chunked;
mod headers;
mod serializer;
mod version;

pub use tracker::CountDown;
pub use version::Version;
