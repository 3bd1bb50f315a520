use std::mem;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Instant;

use futures::{Future, Async, Poll};
use futures_cpupool::{CpuPool, CpuFuture};
use tokio_core::net::{TcpStream, TcpStreamNew};
use tokio_core::reactor::{Handle, Timeout};

use client::proto::Proto;
use client::{AttemptCallback, Config, Error, Execution, Outcome, Target};


/// A request to connect to the target, queued to a reactor worker
///
/// If the submission is dropped before a worker picks it up (i.e. the
/// reactor is shutting down) the callback receives `cancelled`.
pub struct Submission {
    target: Option<Target>,
    callback: Arc<AttemptCallback>,
}

enum State {
    Resolving {
        future: CpuFuture<SocketAddr, Error>,
        deadline: Timeout,
    },
    Connecting {
        future: TcpStreamNew,
        deadline: Timeout,
    },
    Active {
        proto: Proto<TcpStream>,
        idle: Timeout,
    },
    Done,
    Void,
}

/// A single connection from name lookup to the teardown
///
/// Resolves when the connection is done for any reason, all errors
/// are reported to the callback, observer or execution.
pub struct Connection {
    target: Target,
    callback: Arc<AttemptCallback>,
    state: State,
    execution: Arc<Execution>,
    config: Arc<Config>,
    handle: Handle,
}

impl Submission {
    pub fn new(target: Target, callback: Arc<AttemptCallback>) -> Submission {
        Submission {
            target: Some(target),
            callback: callback,
        }
    }
    pub fn target(&self) -> &Target {
        self.target.as_ref().expect("target is still here")
    }
    fn into_parts(mut self) -> (Target, Arc<AttemptCallback>) {
        let target = self.target.take().expect("target is still here");
        (target, self.callback.clone())
    }
}

impl Drop for Submission {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            self.callback.report(&target, Outcome::Cancelled);
        }
    }
}

fn resolve(pool: &CpuPool, target: &Target) -> CpuFuture<SocketAddr, Error> {
    let host = target.host().to_string();
    let port = target.port();
    pool.spawn_fn(move || -> Result<SocketAddr, Error> {
        let mut addrs = (&host[..], port).to_socket_addrs()?;
        addrs.next().ok_or(Error::NameNotFound)
    })
}

fn set_options(sock: &TcpStream, config: &Config) -> Result<(), Error> {
    sock.set_nodelay(config.tcp_nodelay)?;
    sock.set_recv_buffer_size(config.socket_buffer_size)?;
    sock.set_send_buffer_size(config.socket_buffer_size)?;
    Ok(())
}

/// Returns true if the deadline has passed
fn expired(deadline: &mut Timeout) -> Result<bool, Error> {
    match deadline.poll()? {
        Async::Ready(()) => Ok(true),
        Async::NotReady => Ok(false),
    }
}

impl Connection {
    pub fn new(submission: Submission, resolver: &CpuPool,
        execution: &Arc<Execution>, config: &Arc<Config>, handle: &Handle)
        -> Connection
    {
        let (target, callback) = submission.into_parts();
        let state = match Timeout::new(config.connect_timeout, handle) {
            Ok(deadline) => State::Resolving {
                future: resolve(resolver, &target),
                deadline: deadline,
            },
            Err(e) => {
                callback.report(&target, Outcome::Failed(e.into()));
                State::Done
            }
        };
        Connection {
            target: target,
            callback: callback,
            state: state,
            execution: execution.clone(),
            config: config.clone(),
            handle: handle.clone(),
        }
    }

    fn connected(&mut self, sock: TcpStream) -> State {
        if let Err(e) = set_options(&sock, &self.config) {
            warn!("Can't set socket options for {}: {}", self.target, e);
        }
        let idle = match Timeout::new(self.config.socket_timeout, &self.handle)
        {
            Ok(idle) => idle,
            Err(e) => {
                self.callback.report(&self.target,
                    Outcome::Failed(e.into()));
                return State::Done;
            }
        };
        self.callback.report(&self.target, Outcome::Connected);
        if let Some(ref observer) = self.config.observer {
            observer.connection_open(&self.target);
        }
        let context = self.execution.initialize_context(&self.target);
        State::Active {
            proto: Proto::new(sock, context, &self.execution, &self.config),
            idle: idle,
        }
    }

    fn attempt_failed(&mut self, outcome: Outcome) -> Poll<(), ()> {
        self.state = State::Done;
        self.callback.report(&self.target, outcome);
        Ok(Async::Ready(()))
    }

    fn finish(&mut self, mut proto: Proto<TcpStream>, err: Option<Error>)
        -> Poll<(), ()>
    {
        self.state = State::Done;
        if let Some(err) = err {
            warn!("Connection to {} failed: {}", self.target, err);
            if let Some(ref observer) = self.config.observer {
                match err {
                    Error::Timeout => observer.connection_timeout(&self.target),
                    Error::Io(ref e) => {
                        observer.fatal_io_error(e, &self.target)
                    }
                    ref e => observer.fatal_protocol_error(e, &self.target),
                }
            }
        }
        self.execution.finalize_context(proto.context_mut());
        if let Some(ref observer) = self.config.observer {
            observer.connection_closed(&self.target);
        }
        Ok(Async::Ready(()))
    }
}

impl Future for Connection {
    type Item = ();
    type Error = ();
    fn poll(&mut self) -> Poll<(), ()> {
        use self::State::*;
        loop {
            self.state = match mem::replace(&mut self.state, Void) {
                Resolving { mut future, mut deadline } => {
                    match future.poll() {
                        Ok(Async::Ready(addr)) => {
                            debug!("Resolved {} to {}", self.target, addr);
                            Connecting {
                                future: TcpStream::connect(&addr, &self.handle),
                                deadline: deadline,
                            }
                        }
                        Ok(Async::NotReady) => match expired(&mut deadline) {
                            Ok(false) => {
                                self.state = Resolving {
                                    future: future,
                                    deadline: deadline,
                                };
                                return Ok(Async::NotReady);
                            }
                            Ok(true) => {
                                return self.attempt_failed(Outcome::TimedOut);
                            }
                            Err(e) => {
                                return self.attempt_failed(Outcome::Failed(e));
                            }
                        },
                        Err(e) => {
                            return self.attempt_failed(Outcome::Failed(e));
                        }
                    }
                }
                Connecting { mut future, mut deadline } => {
                    match future.poll() {
                        Ok(Async::Ready(sock)) => self.connected(sock),
                        Ok(Async::NotReady) => match expired(&mut deadline) {
                            Ok(false) => {
                                self.state = Connecting {
                                    future: future,
                                    deadline: deadline,
                                };
                                return Ok(Async::NotReady);
                            }
                            Ok(true) => {
                                return self.attempt_failed(Outcome::TimedOut);
                            }
                            Err(e) => {
                                return self.attempt_failed(Outcome::Failed(e));
                            }
                        },
                        Err(e) => {
                            return self.attempt_failed(
                                Outcome::Failed(e.into()));
                        }
                    }
                }
                Active { mut proto, mut idle } => {
                    match expired(&mut idle) {
                        Ok(false) => {}
                        Ok(true) => {
                            return self.finish(proto, Some(Error::Timeout));
                        }
                        Err(e) => return self.finish(proto, Some(e)),
                    }
                    match proto.poll() {
                        Ok(Async::Ready(())) => return self.finish(proto, None),
                        Err(e) => return self.finish(proto, Some(e)),
                        Ok(Async::NotReady) => {}
                    }
                    // Any wakeup which is not a timer is an activity
                    idle.reset(Instant::now() + self.config.socket_timeout);
                    match expired(&mut idle) {
                        Ok(false) => {}
                        Ok(true) => {
                            return self.finish(proto, Some(Error::Timeout));
                        }
                        Err(e) => return self.finish(proto, Some(e)),
                    }
                    self.state = Active { proto: proto, idle: idle };
                    return Ok(Async::NotReady);
                }
                Done => {
                    self.state = Done;
                    return Ok(Async::Ready(()));
                }
                Void => unreachable!(),
            };
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        match mem::replace(&mut self.state, State::Done) {
            State::Resolving { .. } | State::Connecting { .. } => {
                self.callback.report(&self.target, Outcome::Cancelled);
            }
            State::Active { proto, .. } => {
                debug!("Connection to {} is dropped", self.target);
                self.finish(proto, None).ok();
            }
            State::Done | State::Void => {}
        }
    }
}
