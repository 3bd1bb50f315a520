use std::fmt;
use std::str::FromStr;

use url::{Url, Host};

use client::Error;


/// A single url requested in the batch
///
/// Only plain `http` targets are supported. The path includes the query
/// string, and is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    port: u16,
    path: String,
}

impl Target {
    /// Create a target from its parts
    pub fn new(host: &str, port: u16, path: &str) -> Target {
        Target {
            host: host.to_string(),
            port: port,
            path: if path.is_empty() { "/".to_string() }
                  else { path.to_string() },
        }
    }

    /// Create a target from a parsed url
    pub fn from_url(url: &Url) -> Result<Target, Error> {
        if url.scheme() != "http" {
            return Err(Error::UnsupportedScheme);
        }
        let host = match url.host() {
            Some(Host::Domain(dom)) => dom.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(Error::UnsupportedScheme),
        };
        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        Ok(Target::new(&host, url.port_or_known_default().unwrap_or(80),
                       &path))
    }

    /// Host name or IP address, IPv6 addresses are not bracketed
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Request path including the query string
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value suitable for the `Host` header
    ///
    /// Port is omitted when it's a default one.
    pub fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == 80 {
            host
        } else {
            format!("{}:{}", host, self.port)
        }
    }
}

impl FromStr for Target {
    type Err = Error;
    fn from_str(s: &str) -> Result<Target, Error> {
        Target::from_url(&Url::parse(s)?)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.host_header(), self.path)
    }
}
