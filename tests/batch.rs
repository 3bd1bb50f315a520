extern crate tk_reactor;

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tk_reactor::CountDown;
use tk_reactor::client::{Client, Config, Context, CountingCallback, Error};
use tk_reactor::client::{EventObserver, Execution, LogResponse, Processor};
use tk_reactor::client::{Reactor, Response, Target};


#[derive(Clone, Copy)]
enum Mode {
    Respond,
    Chunked,
    Reset,
    Silent,
}

/// Blocking HTTP server that answers every connection the same way
struct MockServer {
    port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

fn read_request(sock: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !String::from_utf8_lossy(&buf).contains("\r\n\r\n") {
        match sock.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn serve(mut sock: TcpStream, mode: Mode, requests: Arc<Mutex<Vec<String>>>)
{
    let request = read_request(&mut sock);
    requests.lock().unwrap().push(request);
    match mode {
        Mode::Respond => {
            sock.write_all(b"HTTP/1.1 200 OK\r\n\
                             Content-Length: 5\r\n\r\nhello").ok();
        }
        Mode::Chunked => {
            sock.write_all(b"HTTP/1.1 200 OK\r\n\
                             Transfer-Encoding: chunked\r\n\r\n\
                             5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n").ok();
        }
        Mode::Reset => {}
        Mode::Silent => {
            thread::sleep(Duration::from_secs(5));
        }
    }
}

impl MockServer {
    fn start(mode: Mode) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let reqs = requests.clone();
        thread::spawn(move || {
            for sock in listener.incoming() {
                if let Ok(sock) = sock {
                    let reqs = reqs.clone();
                    thread::spawn(move || serve(sock, mode, reqs));
                }
            }
        });
        MockServer {
            port: port,
            requests: requests,
        }
    }
    fn target(&self, path: &str) -> Target {
        Target::new("127.0.0.1", self.port, path)
    }
    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn refused_target() -> Target {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Target::new("127.0.0.1", port, "/")
}

fn config() -> Config {
    let mut cfg = Config::new();
    cfg.socket_timeout(Duration::from_secs(3));
    cfg.connect_timeout(Duration::from_secs(3));
    cfg
}

/// Client that stores bodies of all the responses
fn recording_client(config: Arc<Config>) -> (Client, Arc<Mutex<Vec<Vec<u8>>>>)
{
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let mut client = Client::new(&config);
    let store = bodies.clone();
    client.handler(move |resp: &Response, _: &Context| -> Result<(), Error> {
        store.lock().unwrap().push(resp.body().to_vec());
        Ok(())
    });
    (client, bodies)
}

/// Reactor whose execution counts down the `tracker`
fn reactor(config: &Arc<Config>, tracker: &Arc<CountDown>) -> Reactor {
    let exec = Arc::new(Execution::new(tracker, Arc::new(LogResponse),
        Arc::new(Processor::standard()), config));
    let mut reactor = Reactor::new(config, &exec);
    reactor.start().unwrap();
    reactor
}

fn wait_until<F: Fn() -> bool>(timeout: Duration, cond: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    cond()
}

#[derive(Default)]
struct Events {
    open: AtomicUsize,
    timeout: AtomicUsize,
    closed: AtomicUsize,
    protocol: AtomicUsize,
}

struct CountEvents(Arc<Events>);

impl EventObserver for CountEvents {
    fn connection_open(&self, _: &Target) {
        self.0.open.fetch_add(1, Ordering::SeqCst);
    }
    fn connection_timeout(&self, _: &Target) {
        self.0.timeout.fetch_add(1, Ordering::SeqCst);
    }
    fn connection_closed(&self, _: &Target) {
        self.0.closed.fetch_add(1, Ordering::SeqCst);
    }
    fn fatal_protocol_error(&self, _: &Error, _: &Target) {
        self.0.protocol.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn all_targets_respond() {
    let server = MockServer::start(Mode::Respond);
    let (client, bodies) = recording_client(config().done());
    let targets = vec![
        server.target("/1"),
        server.target("/2"),
        server.target("/3"),
    ];
    assert!(client.fetch_timeout(targets, Duration::from_secs(10)));
    let bodies = bodies.lock().unwrap();
    assert_eq!(bodies.len(), 3);
    assert!(bodies.iter().all(|b| &b[..] == b"hello"));
    assert_eq!(server.requests().len(), 3);
}

#[test]
fn one_target_refused() {
    let server = MockServer::start(Mode::Respond);
    let (client, bodies) = recording_client(config().done());
    let targets = vec![
        server.target("/1"),
        refused_target(),
        server.target("/2"),
    ];
    assert!(client.fetch_timeout(targets, Duration::from_secs(10)));
    assert_eq!(bodies.lock().unwrap().len(), 2);
}

#[test]
fn reset_after_request() {
    let server = MockServer::start(Mode::Reset);
    let events = Arc::new(Events::default());
    let (client, bodies) = recording_client(
        config().observer(CountEvents(events.clone())).done());
    assert!(client.fetch_timeout(vec![server.target("/")],
                                 Duration::from_secs(10)));
    assert_eq!(bodies.lock().unwrap().len(), 0);
    assert_eq!(server.requests().len(), 1);
    assert_eq!(events.open.load(Ordering::SeqCst), 1);
    assert_eq!(events.protocol.load(Ordering::SeqCst), 1);
    assert_eq!(events.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn empty_batch() {
    let client = Client::new(&config().done());
    assert!(client.fetch_timeout(Vec::new(), Duration::from_secs(1)));
    client.fetch(Vec::new());
}

#[test]
fn idle_socket_times_out() {
    let server = MockServer::start(Mode::Silent);
    let events = Arc::new(Events::default());
    let (client, bodies) = recording_client(config()
        .socket_timeout(Duration::from_millis(200))
        .observer(CountEvents(events.clone()))
        .done());
    assert!(client.fetch_timeout(vec![server.target("/")],
                                 Duration::from_secs(4)));
    assert_eq!(bodies.lock().unwrap().len(), 0);
    assert_eq!(events.timeout.load(Ordering::SeqCst), 1);
    assert_eq!(events.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn chunked_response() {
    let server = MockServer::start(Mode::Chunked);
    let (client, bodies) = recording_client(config().done());
    assert!(client.fetch_timeout(vec![server.target("/")],
                                 Duration::from_secs(10)));
    assert_eq!(&bodies.lock().unwrap()[..], &[b"hello world".to_vec()]);
}

#[test]
fn request_on_the_wire() {
    let server = MockServer::start(Mode::Respond);
    let (client, _) = recording_client(
        config().user_agent("batch-test/1.0").done());
    assert!(client.fetch_timeout(vec![server.target("/path?x=1")],
                                 Duration::from_secs(10)));
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let expected = format!("GET /path?x=1 HTTP/1.1\r\n\
                            Host: 127.0.0.1:{}\r\n\
                            Connection: Keep-Alive\r\n\
                            User-Agent: batch-test/1.0\r\n\r\n",
                            server.port);
    assert_eq!(requests[0], expected);
}

#[test]
fn no_keep_alive() {
    let server = MockServer::start(Mode::Respond);
    let (client, _) = recording_client(config().keep_alive(false).done());
    assert!(client.fetch_timeout(vec![server.target("/")],
                                 Duration::from_secs(10)));
    assert!(server.requests()[0].contains("\r\nConnection: close\r\n"));
}

#[test]
fn handler_panic_does_not_block() {
    let server = MockServer::start(Mode::Respond);
    let mut client = Client::new(&config().workers(1).done());
    client.handler(|_: &Response, _: &Context| -> Result<(), Error> {
        panic!("handler failure");
    });
    let targets = vec![server.target("/1"), server.target("/2")];
    assert!(client.fetch_timeout(targets, Duration::from_secs(10)));
}

#[test]
fn observer_sees_every_connection() {
    let server = MockServer::start(Mode::Respond);
    let events = Arc::new(Events::default());
    let (client, _) = recording_client(
        config().observer(CountEvents(events.clone())).done());
    let targets = vec![server.target("/1"), server.target("/2")];
    assert!(client.fetch_timeout(targets, Duration::from_secs(10)));
    assert_eq!(events.open.load(Ordering::SeqCst), 2);
    assert_eq!(events.closed.load(Ordering::SeqCst), 2);
    assert_eq!(events.timeout.load(Ordering::SeqCst), 0);
}

#[test]
fn fetch_urls_skips_invalid() {
    let server = MockServer::start(Mode::Respond);
    let (client, bodies) = recording_client(config().done());
    let url = server.url("/ok");
    client.fetch_urls(&["not a url", "https://127.0.0.1/", &url[..]]);
    assert_eq!(bodies.lock().unwrap().len(), 1);
    assert!(server.requests()[0].starts_with("GET /ok HTTP/1.1\r\n"));
}

#[test]
fn every_outcome_counted_once() {
    let ok = MockServer::start(Mode::Respond);
    let reset = MockServer::start(Mode::Reset);
    let silent = MockServer::start(Mode::Silent);
    let targets = vec![
        ok.target("/1"),
        ok.target("/2"),
        reset.target("/"),
        refused_target(),
        silent.target("/"),
        Target::new("no-such-host.invalid", 80, "/"),
    ];
    // one extra count so that counting some target twice is visible
    let tracker = Arc::new(CountDown::new(targets.len() + 1));
    let mut cfg = config();
    cfg.socket_timeout(Duration::from_millis(200));
    cfg.connect_timeout(Duration::from_secs(2));
    let mut reactor = reactor(&cfg.done(), &tracker);
    for target in targets {
        reactor.connect(target, Arc::new(CountingCallback::new(&tracker)));
    }
    assert!(wait_until(Duration::from_secs(8), || tracker.count() <= 1));
    thread::sleep(Duration::from_millis(300));
    reactor.shutdown();
    assert_eq!(tracker.count(), 1);
}

#[test]
fn shutdown_finalizes_active_connection() {
    let server = MockServer::start(Mode::Silent);
    let events = Arc::new(Events::default());
    let tracker = Arc::new(CountDown::new(2));
    let mut cfg = config();
    cfg.socket_timeout(Duration::from_secs(30));
    cfg.observer(CountEvents(events.clone()));
    let mut reactor = reactor(&cfg.done(), &tracker);
    reactor.connect(server.target("/"),
        Arc::new(CountingCallback::new(&tracker)));
    assert!(wait_until(Duration::from_secs(5),
        || server.requests().len() == 1));
    assert_eq!(tracker.count(), 2);
    reactor.shutdown();
    assert_eq!(tracker.count(), 1);
    assert_eq!(events.open.load(Ordering::SeqCst), 1);
    assert_eq!(events.closed.load(Ordering::SeqCst), 1);
    assert_eq!(events.timeout.load(Ordering::SeqCst), 0);
}

#[test]
fn shutdown_cancels_queued_submissions() {
    let server = MockServer::start(Mode::Silent);
    let targets = 20;
    let tracker = Arc::new(CountDown::new(targets + 1));
    let mut cfg = config();
    cfg.socket_timeout(Duration::from_secs(30));
    cfg.workers(1);
    let mut reactor = reactor(&cfg.done(), &tracker);
    for i in 0..targets {
        reactor.connect(server.target(&format!("/{}", i)),
            Arc::new(CountingCallback::new(&tracker)));
    }
    reactor.shutdown();
    assert_eq!(tracker.count(), 1);
}

#[test]
fn fetch_timeout_expires() {
    let server = MockServer::start(Mode::Silent);
    let events = Arc::new(Events::default());
    let (client, bodies) = recording_client(config()
        .socket_timeout(Duration::from_secs(30))
        .observer(CountEvents(events.clone()))
        .done());
    let start = Instant::now();
    assert!(!client.fetch_timeout(vec![server.target("/")],
                                  Duration::from_millis(500)));
    assert!(start.elapsed() < Duration::from_secs(4));
    assert_eq!(bodies.lock().unwrap().len(), 0);
    assert_eq!(events.closed.load(Ordering::SeqCst), 1);
    assert_eq!(events.timeout.load(Ordering::SeqCst), 0);
}
