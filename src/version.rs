use std::fmt;

/// Enum representing HTTP version.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    /// Converts the minor version number reported by `httparse`
    ///
    /// `httparse` only accepts `HTTP/1.0` and `HTTP/1.1`, so anything
    /// non-zero is HTTP/1.1.
    pub fn from_httparse(minor: u8) -> Version {
        match minor {
            0 => Version::Http10,
            _ => Version::Http11,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Version::Http10 => f.write_str("HTTP/1.0"),
            Version::Http11 => f.write_str("HTTP/1.1"),
        }
    }
}
