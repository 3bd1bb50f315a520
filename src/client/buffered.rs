//! Fully buffered responses
//!
//! The whole response, both headers and body, is collected on the heap
//! before it's passed to the response handler.
use client::{Error, Codec, Head};
use version::Version;


/// A buffered response holds the whole body as contiguous chunk of data
#[derive(Debug, Clone)]
pub struct Response {
    version: Version,
    code: u16,
    reason: String,
    headers: Vec<(String, Vec<u8>)>,
    body: Vec<u8>,
}

/// Codec that collects response into the `Response` structure
pub struct Buffered {
    response: Option<Response>,
    complete: bool,
}

impl Response {
    /// Create a response with no headers and empty body
    pub fn new(version: Version, code: u16, reason: &str) -> Response {
        Response {
            version: version,
            code: code,
            reason: reason.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
    pub fn version(&self) -> Version {
        self.version
    }
    /// Get response code
    pub fn code(&self) -> u16 {
        self.code
    }
    /// Get response reason (you shouldn't rely on this, use `code()`)
    pub fn reason(&self) -> &str {
        &self.reason
    }
    /// Status line as it would appear on the wire, without line ending
    pub fn status_line(&self) -> String {
        format!("{} {} {}", self.version, self.code, self.reason)
    }
    /// Get response headers, all of them as received
    pub fn headers(&self) -> &[(String, Vec<u8>)] {
        &self.headers
    }
    /// First value of the header
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers.iter()
            .find(|&&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, ref v)| &v[..])
    }
    pub fn add_header(&mut self, name: &str, value: &[u8]) {
        self.headers.push((name.to_string(), value.to_vec()));
    }
    /// Get response body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }
}

impl Buffered {
    pub fn new() -> Buffered {
        Buffered {
            response: None,
            complete: false,
        }
    }
    /// Returns the response if it has been received completely
    pub fn into_response(self) -> Option<Response> {
        if self.complete { self.response } else { None }
    }
}

impl Codec for Buffered {
    fn headers_received(&mut self, head: &Head) -> Result<(), Error> {
        let (code, reason) = head.raw_status();
        let mut response = Response::new(head.version(), code, reason);
        for header in head.all_headers() {
            response.add_header(header.name, header.value);
        }
        self.response = Some(response);
        Ok(())
    }
    fn data_received(&mut self, data: &[u8]) -> Result<(), Error> {
        if let Some(ref mut response) = self.response {
            response.set_body(data.to_vec());
            self.complete = true;
        }
        Ok(())
    }
}
