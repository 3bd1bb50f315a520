use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use client::{Config, Context, Error, Processor, Request, Response, Target};
use client::RequestState::{Sent, ResponseReceived};
use tracker::CountDown;


/// Consumer of the responses
///
/// Called on a reactor thread, so it should not block for long. Errors
/// and panics are logged and otherwise ignored, the connection is
/// considered completed either way.
pub trait ResponseHandler: Send + Sync {
    fn handle(&self, response: &Response, context: &Context)
        -> Result<(), Error>;
}

/// Response handler that just logs every response
#[derive(Debug, Clone, Copy)]
pub struct LogResponse;

/// Drives the single request of every connection
///
/// The execution is shared by all connections of a batch. Each
/// connection owns a `Context` which is the only per-connection state,
/// and passes it to the methods below in this order: `initialize_context`,
/// `submit_request` (possibly many times), `handle_response`,
/// `finalize_context`.
pub struct Execution {
    tracker: Arc<CountDown>,
    handler: Arc<ResponseHandler>,
    processor: Arc<Processor>,
    config: Arc<Config>,
}

impl<F> ResponseHandler for F
    where F: Fn(&Response, &Context) -> Result<(), Error> + Send + Sync
{
    fn handle(&self, response: &Response, context: &Context)
        -> Result<(), Error>
    {
        (self)(response, context)
    }
}

impl ResponseHandler for LogResponse {
    fn handle(&self, response: &Response, context: &Context)
        -> Result<(), Error>
    {
        info!("{}: {}, document length: {}", context.target(),
            response.status_line(), response.body().len());
        Ok(())
    }
}

fn panic_message(err: &Box<Any + Send>) -> &str {
    if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else if let Some(s) = err.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

impl Execution {
    pub fn new(tracker: &Arc<CountDown>, handler: Arc<ResponseHandler>,
        processor: Arc<Processor>, config: &Arc<Config>)
        -> Execution
    {
        Execution {
            tracker: tracker.clone(),
            handler: handler,
            processor: processor,
            config: config.clone(),
        }
    }

    /// Create the context for a connection that has just been established
    pub fn initialize_context(&self, target: &Target) -> Context {
        debug!("Connected to {}", target);
        Context::new(target.clone())
    }

    /// Returns the request to send, if there is one
    ///
    /// Only a single request is made per connection, so after the first
    /// call this returns `None`.
    pub fn submit_request(&self, context: &mut Context)
        -> Result<Option<Request>, Error>
    {
        if context.is_sent() || context.is_finalized() {
            return Ok(None);
        }
        let mut request = Request::get(context.target().path(),
                                       self.config.version);
        self.processor.process(&mut request, context, &self.config)?;
        info!("Sending request to {}", context.target());
        context.advance(Sent);
        Ok(Some(request))
    }

    /// Passes the response to the handler and marks the target completed
    pub fn handle_response(&self, response: Response, context: &mut Context)
    {
        if context.is_finalized() || context.is_response_received() {
            warn!("Unexpected response from {}, ignoring: {}",
                context.target(), response.status_line());
            return;
        }
        let result = {
            let ctx = &*context;
            catch_unwind(AssertUnwindSafe(|| {
                self.handler.handle(&response, ctx)
            }))
        };
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Response handler failed for {}: {}",
                    context.target(), e);
            }
            Err(e) => {
                error!("Response handler panicked for {}: {}",
                    context.target(), panic_message(&e));
            }
        }
        context.advance(ResponseReceived);
        self.tracker.count_down();
    }

    /// Called when the connection is torn down for any reason
    ///
    /// Extra calls are no-ops.
    pub fn finalize_context(&self, context: &mut Context) {
        if !context.finalize() {
            return;
        }
        if !context.is_response_received() {
            debug!("Connection to {} closed without response",
                context.target());
            self.tracker.count_down();
        }
    }
}
