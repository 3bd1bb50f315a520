use std::sync::Arc;
use std::time::Duration;

use url::Url;

use client::{Config, Context, CountingCallback, Error, Execution};
use client::{LogResponse, Processor, Reactor, Response, ResponseHandler};
use client::Target;
use tracker::CountDown;


/// Fetches a batch of urls and blocks until all of them are completed
///
/// Every target is completed exactly once: either the response is
/// passed to the handler, or connection fails or is closed before the
/// response. Failures are logged and are never returned from the
/// `fetch*` methods.
pub struct Client {
    config: Arc<Config>,
    handler: Arc<ResponseHandler>,
    processor: Arc<Processor>,
}

impl Client {
    /// Create a client that logs every response and uses the standard
    /// request interceptors
    pub fn new(config: &Arc<Config>) -> Client {
        Client {
            config: config.clone(),
            handler: Arc::new(LogResponse),
            processor: Arc::new(Processor::standard()),
        }
    }
    /// Use the closure as a response handler
    pub fn handler<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&Response, &Context) -> Result<(), Error>,
              F: Send + Sync + 'static,
    {
        self.handler = Arc::new(f);
        self
    }
    pub fn response_handler<H>(&mut self, handler: H) -> &mut Self
        where H: ResponseHandler + 'static,
    {
        self.handler = Arc::new(handler);
        self
    }
    /// Replace the chain of request interceptors
    pub fn processor(&mut self, processor: Processor) -> &mut Self {
        self.processor = Arc::new(processor);
        self
    }

    /// Fetch all the targets, blocks until all of them are completed
    ///
    /// Note: if some connection hangs in a way that isn't covered by
    /// the timeouts in the `Config` this method never returns. Use
    /// `fetch_timeout` if it's an issue.
    pub fn fetch(&self, targets: Vec<Target>) {
        self.run(targets, None);
    }

    /// Same as `fetch` but returns `false` if not all targets were
    /// completed within `timeout`
    ///
    /// Unfinished connections are dropped in this case.
    pub fn fetch_timeout(&self, targets: Vec<Target>, timeout: Duration)
        -> bool
    {
        self.run(targets, Some(timeout))
    }

    /// Parse urls and fetch them, invalid urls are logged and skipped
    pub fn fetch_urls(&self, urls: &[&str]) {
        let targets = urls.iter().filter_map(|url| {
            match Url::parse(url).map_err(Error::from)
                .and_then(|url| Target::from_url(&url))
            {
                Ok(target) => Some(target),
                Err(e) => {
                    error!("Skipping url {:?}: {}", url, e);
                    None
                }
            }
        }).collect();
        self.fetch(targets);
    }

    fn run(&self, targets: Vec<Target>, timeout: Option<Duration>) -> bool {
        let tracker = Arc::new(CountDown::new(targets.len()));
        let execution = Arc::new(Execution::new(&tracker,
            self.handler.clone(), self.processor.clone(), &self.config));
        let mut reactor = Reactor::new(&self.config, &execution);
        if let Err(e) = reactor.start() {
            error!("Can't start I/O reactor: {}", e);
        }
        for target in targets {
            reactor.connect(target,
                Arc::new(CountingCallback::new(&tracker)));
        }
        let done = match timeout {
            Some(timeout) => tracker.wait_timeout(timeout),
            None => {
                tracker.wait();
                true
            }
        };
        if !done {
            warn!("Timed out, {} connections are not completed",
                tracker.count());
        }
        info!("Shutting down I/O reactor");
        reactor.shutdown();
        info!("Done");
        done
    }
}
