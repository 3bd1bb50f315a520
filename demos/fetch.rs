extern crate tk_reactor;
extern crate argparse;
extern crate env_logger;

use std::env;
use std::io::{self, Write};
use std::time::Duration;

use argparse::{ArgumentParser, List, Store, StoreTrue};
use tk_reactor::client::{Client, Config, Context, Error, EventLogger};
use tk_reactor::client::Response;


pub struct Options {
    pub urls: Vec<String>,
    pub workers: usize,
    pub timeout: u64,
    pub dump_header: bool,
    pub verbose_events: bool,
}


pub fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "warn");
    }
    env_logger::init().unwrap();

    let mut opt = Options {
        urls: Vec::new(),
        workers: 2,
        timeout: 0,
        dump_header: false,
        verbose_events: false,
    };
    {
        let mut ap = ArgumentParser::new();
        ap.set_description("
            Fetch all the specified urls concurrently and print the status
            line of every response
        ");
        ap.refer(&mut opt.urls)
            .add_argument("url", List, "
                Fetch specified urls
            ").required();
        ap.refer(&mut opt.workers)
            .add_option(&["-w", "--workers"], Store,
                "Number of reactor threads (default 2)");
        ap.refer(&mut opt.timeout)
            .add_option(&["-t", "--timeout"], Store,
                "Give up after this number of seconds (default is to wait
                 for all the connections to complete)");
        ap.refer(&mut opt.dump_header)
            .add_option(&["-D", "--dump-header"], StoreTrue,
                "Print response headers too");
        ap.refer(&mut opt.verbose_events)
            .add_option(&["--log-events"], StoreTrue,
                "Log connection events");
        ap.parse_args_or_exit();
    }

    let mut cfg = Config::new();
    cfg.workers(opt.workers);
    if opt.verbose_events {
        cfg.observer(EventLogger);
    }
    let mut client = Client::new(&cfg.done());
    let dump_header = opt.dump_header;
    client.handler(move |response: &Response, context: &Context|
        -> Result<(), Error>
    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(&mut out, "{}: {}",
            context.target(), response.status_line())
            .map_err(|e| Error::Handler(e.to_string()))?;
        if dump_header {
            for &(ref k, ref v) in response.headers() {
                writeln!(&mut out,
                    "    {}: {}", k, String::from_utf8_lossy(v))
                    .map_err(|e| Error::Handler(e.to_string()))?;
            }
        }
        Ok(())
    });

    let urls = opt.urls.iter().map(|x| &x[..]).collect::<Vec<_>>();
    if opt.timeout > 0 {
        let targets = urls.iter().filter_map(|u| match u.parse() {
            Ok(target) => Some(target),
            Err(e) => {
                writeln!(&mut io::stderr(), "Skipping {}: {}", u, e).ok();
                None
            }
        }).collect();
        if !client.fetch_timeout(targets, Duration::from_secs(opt.timeout)) {
            writeln!(&mut io::stderr(), "Timed out").ok();
        }
    } else {
        client.fetch_urls(&urls);
    }
}
