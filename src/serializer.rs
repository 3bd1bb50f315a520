//! Request serializer state machine
//!
//! Makes sure that the request written into a buffer is framed correctly:
//! there is at most one body length header, and the body actually matches
//! the declared length.

use std::fmt::Display;
use std::io::Write;

use netbuf::Buf;

use headers;
use version::Version;

quick_error! {
    #[derive(Debug)]
    pub enum HeaderError {
        DuplicateContentLength {
            description("Content-Length is added twice")
        }
        DuplicateTransferEncoding {
            description("Transfer-Encoding is added twice")
        }
        InvalidHeaderName {
            description("Header name contains invalid characters")
        }
        InvalidHeaderValue {
            description("Header value contains invalid characters")
        }
        TransferEncodingAfterContentLength {
            description("Transfer encoding added when Content-Length is \
                already specified")
        }
        ContentLengthAfterTransferEncoding {
            description("Content-Length added after Transfer-Encoding")
        }
        BodyLengthHeader {
            description("Content-Length and Transfer-Encoding must be set \
                using the specialized methods")
        }
    }
}

/// State of an outgoing request
///
/// Note: while we pass buffer to each method, we expect that the same buffer
/// is passed each time
#[derive(Debug)]
pub enum MessageState {
    /// Nothing has been sent.
    RequestStart,
    /// Request line is already in the buffer.
    Headers,
    /// The message contains a fixed size body.
    FixedHeaders { content_length: u64 },
    /// The message contains a chunked body.
    ChunkedHeaders,
    /// The body with the given number of bytes left is being written.
    ///
    /// A request without a `Content-Length` or `Transfer-Encoding`
    /// header field is a fixed body of zero bytes.
    FixedBody { content_length: u64 },
    /// The message contains a chunked body.
    ChunkedBody,
    /// A message in final state.
    Done,
}

fn invalid_header(value: &[u8]) -> bool {
    value.iter().any(|&x| x == b'\r' || x == b'\n')
}

impl MessageState {
    /// Write request line.
    ///
    /// # Panics
    ///
    /// When request line is already written. It's expected that the request
    /// state machine will never call the method twice.
    pub fn request_line(&mut self, buf: &mut Buf,
        method: &str, path: &str, version: Version)
    {
        match *self {
            MessageState::RequestStart => {
                write!(buf, "{} {} {}\r\n", method, path, version).unwrap();
                *self = MessageState::Headers;
            }
            ref state => {
                panic!("Called request_line() method on request in state {:?}",
                       state)
            }
        }
    }

    fn write_formatted<D: Display>(&mut self, buf: &mut Buf,
        name: &str, value: D)
        -> Result<(), HeaderError>
    {
        if invalid_header(name.as_bytes()) {
            return Err(HeaderError::InvalidHeaderName);
        }
        let start = buf.len();
        write!(buf, "{}: ", name).unwrap();
        let value_start = buf.len();
        write!(buf, "{}", value).unwrap();
        if invalid_header(&buf[value_start..]) {
            buf.remove_range(start..);
            return Err(HeaderError::InvalidHeaderValue);
        }
        buf.write_all(b"\r\n").unwrap();
        Ok(())
    }

    /// Add a header to the message.
    ///
    /// `Content-Length` header must be send using the `add_length` method
    /// and `Transfer-Encoding: chunked` must be set with the `add_chunked`
    /// method.
    ///
    /// # Panics
    ///
    /// Panics when `add_header` is called in the wrong state.
    pub fn add_header(&mut self, buf: &mut Buf, name: &str, value: &str)
        -> Result<(), HeaderError>
    {
        if headers::is_content_length(name)
            || headers::is_transfer_encoding(name)
        {
            return Err(HeaderError::BodyLengthHeader)
        }
        match *self {
            MessageState::Headers
            | MessageState::FixedHeaders { .. }
            | MessageState::ChunkedHeaders => {
                self.write_formatted(buf, name, value)
            }
            ref state => {
                panic!("Called add_header() method on a message in state {:?}",
                       state)
            }
        }
    }

    /// Add a content length to the message.
    ///
    /// # Panics
    ///
    /// Panics when `add_length` is called in the wrong state.
    pub fn add_length(&mut self, buf: &mut Buf, n: u64)
        -> Result<(), HeaderError>
    {
        use self::MessageState::*;
        match *self {
            FixedHeaders { .. } => Err(HeaderError::DuplicateContentLength),
            ChunkedHeaders => {
                Err(HeaderError::ContentLengthAfterTransferEncoding)
            }
            Headers => {
                self.write_formatted(buf, "Content-Length", n)?;
                *self = FixedHeaders { content_length: n };
                Ok(())
            }
            ref state => {
                panic!("Called add_length() method on message in state {:?}",
                       state)
            }
        }
    }

    /// Sets the transfer encoding to chunked.
    ///
    /// # Panics
    ///
    /// Panics when `add_chunked` is called in the wrong state.
    pub fn add_chunked(&mut self, buf: &mut Buf)
        -> Result<(), HeaderError>
    {
        use self::MessageState::*;
        match *self {
            FixedHeaders { .. } => {
                Err(HeaderError::TransferEncodingAfterContentLength)
            }
            ChunkedHeaders => Err(HeaderError::DuplicateTransferEncoding),
            Headers => {
                self.write_formatted(buf, "Transfer-Encoding", "chunked")?;
                *self = ChunkedHeaders;
                Ok(())
            }
            ref state => {
                panic!("Called add_chunked() method on message in state {:?}",
                       state)
            }
        }
    }

    /// Closes the HTTP header
    ///
    /// # Panics
    ///
    /// Panics when the request is in a wrong state.
    pub fn done_headers(&mut self, buf: &mut Buf) {
        use self::MessageState::*;
        *self = match *self {
            Headers => FixedBody { content_length: 0 },
            FixedHeaders { content_length } => FixedBody { content_length },
            ChunkedHeaders => ChunkedBody,
            ref state => {
                panic!("Called done_headers() method in state {:?}", state)
            }
        };
        buf.write_all(b"\r\n").unwrap();
    }

    /// Write a chunk of the message body.
    ///
    /// For the chunked body each chunk is prefixed by its size. Empty chunks
    /// are ignored.
    ///
    /// # Panics
    ///
    /// When request is in wrong state or data exceeds declared length.
    pub fn write_body(&mut self, buf: &mut Buf, data: &[u8]) {
        use self::MessageState::*;
        match *self {
            FixedBody { ref mut content_length } => {
                if data.len() as u64 > *content_length {
                    panic!("Fixed size request error. \
                        Bytes left {} but got additional {}",
                        content_length, data.len());
                }
                buf.write_all(data).unwrap();
                *content_length -= data.len() as u64;
            }
            ChunkedBody => if data.len() > 0 {
                write!(buf, "{:x}\r\n", data.len()).unwrap();
                buf.write_all(data).unwrap();
                buf.write_all(b"\r\n").unwrap();
            },
            ref state => {
                panic!("Called write_body() method on message \
                    in state {:?}", state)
            }
        }
    }

    /// Returns true if `done()` method is already called
    pub fn is_complete(&self) -> bool {
        matches!(*self, MessageState::Done)
    }

    /// Writes needed finalization data into the buffer
    ///
    /// The method may be called multiple times.
    ///
    /// # Panics
    ///
    /// When the message is in the wrong state or the body is not finished.
    pub fn done(&mut self, buf: &mut Buf) {
        use self::MessageState::*;
        match *self {
            FixedBody { content_length: 0 } => *self = Done,
            FixedBody { content_length } =>
                panic!("Tried to close message with {} bytes remaining.",
                       content_length),
            ChunkedBody => {
                buf.write_all(b"0\r\n\r\n").unwrap();
                *self = Done;
            }
            Done => {}  // multiple invocations are okay.
            ref state => {
                panic!("Called done() method on request in state {:?}",
                       state);
            }
        }
    }
}
