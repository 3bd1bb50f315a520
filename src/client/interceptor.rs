//! Request interceptors
//!
//! Every request passes through the chain of interceptors right before it
//! is serialized. Interceptors have no state of their own, they only look
//! at the request, connection context and configuration, so single chain
//! is shared by all connections.
use std::sync::Arc;

use client::{Config, Context, Error, Request};
use version::Version;


/// A single stage of request processing
pub trait Interceptor: Send + Sync {
    fn process(&self, request: &mut Request, context: &Context,
        config: &Config)
        -> Result<(), Error>;
}

/// Sets body length headers
///
/// Request without a body gets no body length headers at all, as it's
/// not needed for a request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContent;

/// Sets the `Host` header from the connection target
#[derive(Debug, Clone, Copy)]
pub struct RequestTargetHost;

/// Sets `Connection` header according to `Config::keep_alive`
#[derive(Debug, Clone, Copy)]
pub struct RequestConnControl;

/// Sets `User-Agent` header from `Config::user_agent`
#[derive(Debug, Clone, Copy)]
pub struct RequestUserAgent;

/// Sets `Expect: 100-continue` if enabled by `Config::expect_continue`
#[derive(Debug, Clone, Copy)]
pub struct RequestExpectContinue;

/// An ordered chain of interceptors
#[derive(Clone)]
pub struct Processor {
    stages: Vec<Arc<Interceptor>>,
}

impl Interceptor for RequestContent {
    fn process(&self, request: &mut Request, _context: &Context,
        _config: &Config)
        -> Result<(), Error>
    {
        if request.contains_header("Content-Length") ||
            request.contains_header("Transfer-Encoding")
        {
            return Err(Error::FramingHeaderPresent);
        }
        let length = request.body().map(|b| b.len());
        if let Some(length) = length {
            request.set_header("Content-Length", &length.to_string());
        }
        Ok(())
    }
}

impl Interceptor for RequestTargetHost {
    fn process(&self, request: &mut Request, context: &Context,
        _config: &Config)
        -> Result<(), Error>
    {
        if request.contains_header("Host") {
            return Ok(());
        }
        if context.target().host().is_empty() {
            if request.version() == Version::Http10 {
                return Ok(());
            }
            return Err(Error::TargetHostMissing);
        }
        request.set_header("Host", &context.target().host_header());
        Ok(())
    }
}

impl Interceptor for RequestConnControl {
    fn process(&self, request: &mut Request, _context: &Context,
        config: &Config)
        -> Result<(), Error>
    {
        if !request.contains_header("Connection") {
            let value = if config.keep_alive { "Keep-Alive" } else { "close" };
            request.set_header("Connection", value);
        }
        Ok(())
    }
}

impl Interceptor for RequestUserAgent {
    fn process(&self, request: &mut Request, _context: &Context,
        config: &Config)
        -> Result<(), Error>
    {
        if !request.contains_header("User-Agent") &&
            !config.user_agent.is_empty()
        {
            request.set_header("User-Agent", &config.user_agent);
        }
        Ok(())
    }
}

impl Interceptor for RequestExpectContinue {
    fn process(&self, request: &mut Request, _context: &Context,
        config: &Config)
        -> Result<(), Error>
    {
        let has_body = request.body().map(|b| b.len() > 0).unwrap_or(false);
        if config.expect_continue && has_body &&
            request.version() == Version::Http11 &&
            !request.contains_header("Expect")
        {
            request.set_header("Expect", "100-continue");
        }
        Ok(())
    }
}

impl Processor {
    /// An empty chain, requests are passed unchanged
    pub fn new() -> Processor {
        Processor { stages: Vec::new() }
    }
    /// The chain used by the client by default
    ///
    /// Order matters: later stages look at headers set by earlier ones.
    pub fn standard() -> Processor {
        let mut p = Processor::new();
        p.add(RequestContent)
         .add(RequestTargetHost)
         .add(RequestConnControl)
         .add(RequestUserAgent)
         .add(RequestExpectContinue);
        p
    }
    /// Append an interceptor to the end of the chain
    pub fn add<I: Interceptor + 'static>(&mut self, stage: I) -> &mut Self {
        self.stages.push(Arc::new(stage));
        self
    }
    pub fn len(&self) -> usize {
        self.stages.len()
    }
    /// Run all the stages in order, stopping at the first error
    pub fn process(&self, request: &mut Request, context: &Context,
        config: &Config)
        -> Result<(), Error>
    {
        for stage in &self.stages {
            stage.process(request, context, config)?;
        }
        Ok(())
    }
}
