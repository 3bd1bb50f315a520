//! A fixed pool of event loop threads
//!
//! Every worker runs its own `tokio_core` event loop. Connections are
//! spread between workers round-robin and never move between them.
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use futures::{Future, Stream};
use futures::sync::mpsc::{unbounded, UnboundedSender, UnboundedReceiver};
use futures::sync::oneshot;
use futures_cpupool::{self, CpuPool};
use tokio_core::reactor::Core;

use client::connection::Connection;
use client::{AttemptCallback, Config, Error, Execution, Submission, Target};


/// Run state of the reactor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Created but not started yet
    Inactive,
    /// Worker threads are running and accept connections
    Active,
    /// Workers are being stopped
    ShuttingDown,
    /// All workers are stopped, the reactor can't be restarted
    ShutDown,
}

struct Worker {
    queue: UnboundedSender<Submission>,
    stop: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

/// The I/O reactor: worker threads that run connections
pub struct Reactor {
    status: Status,
    workers: Vec<Worker>,
    next: usize,
    resolver: Option<CpuPool>,
    execution: Arc<Execution>,
    config: Arc<Config>,
}

fn run_worker(id: usize, queue: UnboundedReceiver<Submission>,
    stop: oneshot::Receiver<()>, resolver: CpuPool,
    execution: Arc<Execution>, config: Arc<Config>)
{
    let mut core = match Core::new() {
        Ok(core) => core,
        Err(e) => {
            error!("Can't create event loop for worker {}: {}", id, e);
            return;
        }
    };
    let handle = core.handle();
    let connections = queue.for_each(move |submission| {
        handle.spawn(Connection::new(submission,
            &resolver, &execution, &config, &handle));
        Ok(())
    });
    let stop = stop.then(|_| Ok::<(), ()>(()));
    let result = core.run(connections.select(stop)
        .map(|_| ()).map_err(|_| ()));
    if result.is_err() {
        error!("Event loop of worker {} failed", id);
    }
    debug!("Worker {} stopped", id);
    // Connections still running are dropped together with the core
}

impl Reactor {
    pub fn new(config: &Arc<Config>, execution: &Arc<Execution>) -> Reactor {
        Reactor {
            status: Status::Inactive,
            workers: Vec::new(),
            next: 0,
            resolver: None,
            execution: execution.clone(),
            config: config.clone(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Spawn worker threads
    ///
    /// If some thread can't be spawned, already started ones are shut down.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.status != Status::Inactive {
            warn!("Reactor can't be started in state {:?}", self.status);
            return Ok(());
        }
        self.status = Status::Active;
        let resolver = futures_cpupool::Builder::new()
            .pool_size(1)
            .name_prefix("http-resolver-")
            .create();
        for id in 0..self.config.workers {
            let (tx, rx) = unbounded();
            let (stop_tx, stop_rx) = oneshot::channel();
            let worker_resolver = resolver.clone();
            let execution = self.execution.clone();
            let config = self.config.clone();
            let spawned = thread::Builder::new()
                .name(format!("http-reactor-{}", id))
                .spawn(move || {
                    let result = catch_unwind(AssertUnwindSafe(|| {
                        run_worker(id, rx, stop_rx,
                                   worker_resolver, execution, config)
                    }));
                    if result.is_err() {
                        error!("Worker {} panicked", id);
                    }
                });
            match spawned {
                Ok(thread) => {
                    self.workers.push(Worker {
                        queue: tx,
                        stop: Some(stop_tx),
                        thread: Some(thread),
                    });
                }
                Err(e) => {
                    error!("Can't spawn reactor worker {}: {}", id, e);
                    self.resolver = Some(resolver);
                    self.shutdown();
                    return Err(e.into());
                }
            }
        }
        self.resolver = Some(resolver);
        info!("I/O reactor started with {} workers", self.workers.len());
        Ok(())
    }

    /// Queue a connection to the target on the next worker
    ///
    /// The callback receives exactly one outcome of the attempt. If the
    /// reactor is not running it is `cancelled`.
    pub fn connect(&mut self, target: Target, callback: Arc<AttemptCallback>)
    {
        let submission = Submission::new(target, callback);
        if self.status != Status::Active || self.workers.is_empty() {
            warn!("Reactor is {:?}, can't connect to {}",
                self.status, submission.target());
            return;
        }
        let idx = self.next % self.workers.len();
        self.next = self.next.wrapping_add(1);
        if let Err(e) = self.workers[idx].queue.unbounded_send(submission) {
            let submission = e.into_inner();
            warn!("Reactor worker {} is gone, can't connect to {}",
                idx, submission.target());
        }
    }

    /// Stop all workers and wait for them to exit
    ///
    /// Connections that are still running are dropped, which cancels
    /// pending attempts and finalizes established connections.
    pub fn shutdown(&mut self) {
        match self.status {
            Status::Active => {}
            Status::Inactive => {
                self.status = Status::ShutDown;
                return;
            }
            Status::ShuttingDown | Status::ShutDown => return,
        }
        self.status = Status::ShuttingDown;
        for worker in &mut self.workers {
            if let Some(stop) = worker.stop.take() {
                stop.send(()).ok();
            }
        }
        for (id, worker) in self.workers.iter_mut().enumerate() {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!("Reactor worker {} failed", id);
                }
            }
        }
        self.workers.clear();
        self.resolver = None;
        self.status = Status::ShutDown;
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use client::{Config, CountingCallback, Execution, LogResponse};
    use client::{Processor, Target};
    use tracker::CountDown;
    use super::{Reactor, Status};

    fn reactor(tracker: &Arc<CountDown>) -> Reactor {
        let config = Config::new().workers(1).done();
        let exec = Arc::new(Execution::new(tracker, Arc::new(LogResponse),
            Arc::new(Processor::standard()), &config));
        Reactor::new(&config, &exec)
    }

    #[test]
    fn lifecycle() {
        let tracker = Arc::new(CountDown::new(0));
        let mut reactor = reactor(&tracker);
        assert_eq!(reactor.status(), Status::Inactive);
        reactor.start().unwrap();
        assert_eq!(reactor.status(), Status::Active);
        reactor.shutdown();
        assert_eq!(reactor.status(), Status::ShutDown);
        reactor.start().unwrap();
        assert_eq!(reactor.status(), Status::ShutDown);
    }

    #[test]
    fn connect_when_inactive_cancels() {
        let tracker = Arc::new(CountDown::new(1));
        let mut reactor = reactor(&tracker);
        reactor.connect(Target::new("localhost", 1, "/"),
            Arc::new(CountingCallback::new(&tracker)));
        assert_eq!(tracker.count(), 0);
    }
}
