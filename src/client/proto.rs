use std::mem;
use std::sync::Arc;

use futures::{Future, Async, Poll};
use tk_bufstream::{IoBuf, WriteBuf, ReadBuf};
use tokio_io::{AsyncRead, AsyncWrite};

use client::buffered::Buffered;
use client::encoder;
use client::parser::Parser;
use client::{Config, Context, Error, Execution};


enum InState<S> {
    Idle(ReadBuf<S>),
    Read(Parser<S, Buffered>),
    Void,
}

/// A low-level HTTP/1.x client protocol handler
///
/// Writes requests returned by `Execution::submit_request` and reads
/// responses to them. The future resolves when there is nothing more to
/// send and the last response is received.
pub struct Proto<S> {
    writing: WriteBuf<S>,
    reading: InState<S>,
    context: Context,
    execution: Arc<Execution>,
    config: Arc<Config>,
}


impl<S: AsyncRead + AsyncWrite> Proto<S> {
    /// Create a new protocol implementation from a connection
    pub fn new(conn: S, context: Context, execution: &Arc<Execution>,
        cfg: &Arc<Config>)
        -> Proto<S>
    {
        let (cout, cin) = IoBuf::new(conn).split();
        return Proto {
            writing: cout,
            reading: InState::Idle(cin),
            context: context,
            execution: execution.clone(),
            config: cfg.clone(),
        }
    }
}

impl<S> Proto<S> {
    pub fn context(&self) -> &Context {
        &self.context
    }
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }
}

impl<S: AsyncRead + AsyncWrite> Future for Proto<S> {
    type Item = ();
    type Error = Error;
    fn poll(&mut self) -> Poll<(), Error> {
        loop {
            let (state, cont) =
                match mem::replace(&mut self.reading, InState::Void) {
                    InState::Idle(mut io) => {
                        if self.config.stale_connection_check {
                            // Detect connection closed by peer and premature
                            // bytes (there is a response but we didn't send
                            // a request yet)
                            if io.read()? != 0 {
                                return Err(Error::PrematureResponseHeaders);
                            }
                            if io.done() {
                                return Err(Error::Closed);
                            }
                        }
                        let request = self.execution
                            .submit_request(&mut self.context)?;
                        if let Some(request) = request {
                            encoder::write_request(
                                &mut self.writing.out_buf, &request)?;
                            let parser = Parser::new(io, Buffered::new(),
                                request.is_head(),
                                self.config.max_response_length);
                            (InState::Read(parser), true)
                        } else {
                            self.writing.flush()?;
                            if self.writing.out_buf.len() == 0 {
                                return Ok(Async::Ready(()));
                            }
                            (InState::Idle(io), false)
                        }
                    }
                    InState::Read(mut parser) => {
                        self.writing.flush()?;
                        match parser.poll()? {
                            Async::NotReady => (InState::Read(parser), false),
                            Async::Ready(io) => {
                                match parser.into_codec().into_response() {
                                    Some(response) => {
                                        self.execution.handle_response(
                                            response, &mut self.context);
                                    }
                                    None => {
                                        error!("Response from {} is \
                                            incomplete", self.context.target());
                                    }
                                }
                                match io {
                                    Some(io) => (InState::Idle(io), true),
                                    // Connection can't be reused
                                    None => return Ok(Async::Ready(())),
                                }
                            }
                        }
                    }
                    InState::Void => unreachable!(),
                };
            self.reading = state;
            if !cont {
                return Ok(Async::NotReady);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use futures::{Future, Async};
    use tk_bufstream::MockData;

    use client::{Config, Error, Execution, LogResponse, Processor, Target};
    use tracker::CountDown;
    use super::Proto;

    fn proto(mock: &MockData, tracker: &Arc<CountDown>, config: Arc<Config>)
        -> Proto<MockData>
    {
        let exec = Arc::new(Execution::new(tracker, Arc::new(LogResponse),
            Arc::new(Processor::standard()), &config));
        let target = Target::new("example.com", 80, "/index.html");
        let context = exec.initialize_context(&target);
        Proto::new(mock.clone(), context, &exec, &config)
    }

    #[test]
    fn single_exchange() {
        let tracker = Arc::new(CountDown::new(1));
        let mock = MockData::new();
        let mut proto = proto(&mock, &tracker,
            Config::new().user_agent("test/1.0").done());
        assert!(matches!(proto.poll(), Ok(Async::NotReady)));
        assert_eq!(String::from_utf8_lossy(&mock.output(..)),
            "GET /index.html HTTP/1.1\r\n\
             Host: example.com\r\n\
             Connection: Keep-Alive\r\n\
             User-Agent: test/1.0\r\n\r\n");
        assert!(proto.context().is_sent());
        mock.add_input("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
        assert!(matches!(proto.poll(), Ok(Async::Ready(()))));
        assert!(proto.context().is_response_received());
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn bad_response() {
        let tracker = Arc::new(CountDown::new(1));
        let mock = MockData::new();
        let mut proto = proto(&mock, &tracker, Config::new().done());
        assert!(matches!(proto.poll(), Ok(Async::NotReady)));
        mock.add_input("garbage\r\n\r\n");
        assert!(matches!(proto.poll(), Err(Error::Header(..))));
        assert!(!proto.context().is_response_received());
        assert_eq!(tracker.count(), 1);
    }

    #[test]
    fn premature_response() {
        let tracker = Arc::new(CountDown::new(1));
        let mock = MockData::new();
        mock.add_input("HTTP/1.1 200 OK\r\n\r\n");
        let mut proto = proto(&mock, &tracker,
            Config::new().stale_connection_check(true).done());
        assert!(matches!(proto.poll(), Err(Error::PrematureResponseHeaders)));
        assert!(!proto.context().is_sent());
    }
}
