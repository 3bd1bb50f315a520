use httparse::Header;

use client::Head;
use version::Version;


impl<'a> Head<'a> {
    pub fn version(&self) -> Version {
        self.version
    }
    /// Returns raw status code and reason as received
    ///
    /// Note: the reason string may not match the status code or may even be
    /// an empty string.
    pub fn raw_status(&self) -> (u16, &'a str) {
        (self.code, self.reason)
    }
    /// All headers of HTTP response, including hop-by-hop ones
    ///
    /// Duplicate headers are neither glued together nor sorted.
    pub fn all_headers(&self) -> &'a [Header<'a>] {
        self.headers
    }
    /// Returns true if connection can't be reused after this response
    pub fn connection_close(&self) -> bool {
        self.connection_close
    }
}
