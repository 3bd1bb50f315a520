use std::str::from_utf8;

use futures::{Future, Async, Poll};
use httparse;
use tk_bufstream::{ReadBuf, Buf};
use tokio_io::AsyncRead;

use body_parser::{BodyKind, BodyProgress};
use client::{Codec, Error, Head};
use headers;
use version::Version;


/// Number of headers to allocate on a stack
const MIN_HEADERS: usize = 16;
/// A hard limit on the number of headers
const MAX_HEADERS: usize = 1024;


#[derive(Debug, Clone)]
enum State {
    Headers,
    Body(BodyProgress),
}

enum Parsed {
    Partial,
    Interim,
    Final(BodyProgress, bool),
}

/// Reads single response from the connection and feeds it to the codec
pub struct Parser<S, C: Codec> {
    io: Option<ReadBuf<S>>,
    codec: C,
    is_head: bool,
    limit: usize,
    close: bool,
    state: State,
}


fn scan_headers(is_head: bool, code: u16, headers: &[httparse::Header])
    -> Result<(BodyKind, bool), Error>
{
    /// Implements the body length algorithm for responses:
    /// http://httpwg.github.io/specs/rfc7230.html#message.body.length
    ///
    /// Algorithm:
    ///
    /// 1. For HEAD, 1xx, 204, 304 -- no body
    /// 2. If last transfer encoding is chunked -> Chunked
    /// 3. If Content-Length -> Fixed
    /// 4. Else Eof
    use body_parser::BodyKind::*;
    let mut has_content_length = false;
    let mut close = false;
    let no_body = is_head || (code >= 100 && code < 200) ||
        code == 204 || code == 304;
    let mut result = if no_body { Fixed(0) } else { Eof };
    for header in headers.iter() {
        if headers::is_connection(header.name) {
            from_utf8(header.value).map_err(|_| Error::ConnectionInvalid)?;
            if header.value.split(|&x| x == b',').any(headers::is_close) {
                close = true;
            }
        } else if no_body {
            continue;
        } else if headers::is_transfer_encoding(header.name) {
            if let Some(enc) = header.value.split(|&x| x == b',').last() {
                if headers::is_chunked(enc) {
                    if has_content_length {
                        // override but don't allow keep-alive
                        close = true;
                    }
                    result = Chunked;
                }
            }
        } else if headers::is_content_length(header.name) {
            if has_content_length {
                return Err(Error::DuplicateContentLength);
            }
            has_content_length = true;
            if result != Chunked {
                let s = from_utf8(header.value)
                    .map_err(|_| Error::BadContentLength)?;
                let len = s.trim().parse()
                    .map_err(|_| Error::BadContentLength)?;
                result = Fixed(len);
            } else {
                // transfer-encoding has preference and don't allow keep-alive
                close = true;
            }
        }
    }
    if result == Eof {
        // the only way to find the end of the body is to wait for close
        close = true;
    }
    Ok((result, close))
}

fn new_body(kind: BodyKind, limit: usize) -> Result<BodyProgress, Error> {
    match kind {
        BodyKind::Fixed(x) if x > limit as u64 => {
            Err(Error::ResponseBodyTooLong)
        }
        kind => Ok(BodyProgress::new(kind)),
    }
}

fn parse_headers<C: Codec>(buffer: &mut Buf, codec: &mut C,
    is_head: bool, limit: usize)
    -> Result<Parsed, Error>
{
    let (parsed, bytes) = {
        let mut vec;
        let mut headers = [httparse::EMPTY_HEADER; MIN_HEADERS];
        let (ver, code, reason, headers, bytes) = {
            let mut raw = httparse::Response::new(&mut headers);
            let mut result = raw.parse(&buffer[..]);
            if matches!(result, Err(httparse::Error::TooManyHeaders)) {
                vec = vec![httparse::EMPTY_HEADER; MAX_HEADERS];
                raw = httparse::Response::new(&mut vec);
                result = raw.parse(&buffer[..]);
            }
            match result? {
                httparse::Status::Complete(bytes) => {
                    let ver = raw.version.unwrap_or(1);
                    let code = raw.code.unwrap_or(0);
                    let reason = raw.reason.unwrap_or("");
                    (ver, code, reason, raw.headers, bytes)
                }
                httparse::Status::Partial => return Ok(Parsed::Partial),
            }
        };
        if code >= 100 && code < 200 && code != 101 {
            debug!("Skipping interim response {} {}", code, reason);
            (Parsed::Interim, bytes)
        } else {
            let (body, close) = scan_headers(is_head, code, &headers)?;
            // For HTTP/1.0 we could implement Connection: Keep-Alive
            // but hopefully it's rare enough to ignore nowadays
            let close = close || ver == 0 || code == 101;
            let head = Head {
                version: Version::from_httparse(ver),
                code: code,
                reason: reason,
                headers: headers,
                connection_close: close,
            };
            codec.headers_received(&head)?;
            (Parsed::Final(new_body(body, limit)?, close), bytes)
        }
    };
    buffer.consume(bytes);
    Ok(parsed)
}

impl<S, C: Codec> Parser<S, C> {
    /// Creates a parser for response to a request just written
    ///
    /// `is_head` must be set for responses to `HEAD` requests, they have
    /// no body regardless of headers. `limit` is the maximum body size.
    pub fn new(io: ReadBuf<S>, codec: C, is_head: bool, limit: usize)
        -> Parser<S, C>
    {
        Parser {
            io: Some(io),
            codec: codec,
            is_head: is_head,
            limit: limit,
            close: false,
            state: State::Headers,
        }
    }
    /// Returns the codec, presumably after the whole response is received
    pub fn into_codec(self) -> C {
        self.codec
    }
    fn read_and_parse(&mut self) -> Poll<(), Error>
        where S: AsyncRead
    {
        let io = self.io.as_mut().expect("buffer is still here");
        if matches!(self.state, State::Headers) {
            loop {
                match parse_headers(&mut io.in_buf, &mut self.codec,
                                    self.is_head, self.limit)?
                {
                    Parsed::Interim => continue,
                    Parsed::Final(progress, close) => {
                        self.close = close;
                        self.state = State::Body(progress);
                        break;
                    }
                    Parsed::Partial => {}
                }
                if io.read()? == 0 {
                    if io.done() {
                        return Err(Error::ResetOnResponseHeaders);
                    } else {
                        return Ok(Async::NotReady);
                    }
                }
            }
        }
        loop {
            if let State::Body(ref mut progress) = self.state {
                progress.parse(&mut io.in_buf)?;
                let (bytes, done) = progress.check_buf(&io.in_buf, io.done());
                if bytes > self.limit {
                    return Err(Error::ResponseBodyTooLong);
                }
                if done {
                    self.codec.data_received(&io.in_buf[..bytes])?;
                    progress.consume(&mut io.in_buf, bytes);
                    return Ok(Async::Ready(()));
                } else if io.done() {
                    // Bodies delimited by EOF are finished in check_buf
                    return Err(Error::ResetOnResponseBody);
                }
            }
            if io.read()? == 0 {
                if io.done() {
                    continue;
                } else {
                    return Ok(Async::NotReady);
                }
            }
        }
    }
}

impl<S: AsyncRead, C: Codec> Future for Parser<S, C> {
    type Item = Option<ReadBuf<S>>;
    type Error = Error;
    /// Returns None if the connection can't be reused after this response
    fn poll(&mut self) -> Poll<Option<ReadBuf<S>>, Error> {
        match self.read_and_parse()? {
            Async::Ready(()) => {
                let io = self.io.take().expect("buffer still here");
                if self.close {
                    Ok(Async::Ready(None))
                } else {
                    Ok(Async::Ready(Some(io)))
                }
            }
            Async::NotReady => Ok(Async::NotReady),
        }
    }
}

#[cfg(test)]
mod test {
    use futures::{Future, Async};
    use tk_bufstream::{MockData, IoBuf};

    use client::buffered::Buffered;
    use client::Error;
    use version::Version;
    use super::Parser;

    fn parser(mock: &MockData, is_head: bool, limit: usize)
        -> Parser<MockData, Buffered>
    {
        let (_, read) = IoBuf::new(mock.clone()).split();
        Parser::new(read, Buffered::new(), is_head, limit)
    }

    #[test]
    fn fixed_body() {
        let mock = MockData::new();
        let mut p = parser(&mock, false, 1024);
        assert!(matches!(p.poll(), Ok(Async::NotReady)));
        mock.add_input("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhel");
        assert!(matches!(p.poll(), Ok(Async::NotReady)));
        mock.add_input("lo");
        assert!(matches!(p.poll(), Ok(Async::Ready(Some(_)))));
        let resp = p.into_codec().into_response().unwrap();
        assert_eq!(resp.code(), 200);
        assert_eq!(resp.version(), Version::Http11);
        assert_eq!(resp.body(), b"hello");
    }

    #[test]
    fn chunked_body() {
        let mock = MockData::new();
        let mut p = parser(&mock, false, 1024);
        mock.add_input("HTTP/1.1 200 OK\r\n\
                        Transfer-Encoding: chunked\r\n\r\n\
                        5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n");
        assert!(matches!(p.poll(), Ok(Async::Ready(Some(_)))));
        let resp = p.into_codec().into_response().unwrap();
        assert_eq!(resp.body(), b"hello world");
    }

    #[test]
    fn interim_response_skipped() {
        let mock = MockData::new();
        let mut p = parser(&mock, false, 1024);
        mock.add_input("HTTP/1.1 100 Continue\r\n\r\n\
                        HTTP/1.1 204 No Content\r\n\r\n");
        assert!(matches!(p.poll(), Ok(Async::Ready(Some(_)))));
        let resp = p.into_codec().into_response().unwrap();
        assert_eq!(resp.code(), 204);
        assert_eq!(resp.body(), b"");
    }

    #[test]
    fn head_has_no_body() {
        let mock = MockData::new();
        let mut p = parser(&mock, true, 1024);
        mock.add_input("HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n");
        assert!(matches!(p.poll(), Ok(Async::Ready(Some(_)))));
    }

    #[test]
    fn connection_close() {
        let mock = MockData::new();
        let mut p = parser(&mock, false, 1024);
        mock.add_input("HTTP/1.1 200 OK\r\nConnection: close\r\n\
                        Content-Length: 0\r\n\r\n");
        assert!(matches!(p.poll(), Ok(Async::Ready(None))));
    }

    #[test]
    fn http10_closes() {
        let mock = MockData::new();
        let mut p = parser(&mock, false, 1024);
        mock.add_input("HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n");
        assert!(matches!(p.poll(), Ok(Async::Ready(None))));
    }

    #[test]
    fn hop_by_hop_headers_kept() {
        let mock = MockData::new();
        let mut p = parser(&mock, false, 1024);
        mock.add_input("HTTP/1.1 200 OK\r\n\
                        Connection: keep-alive, x-trace\r\n\
                        X-Trace: 1\r\nContent-Length: 2\r\n\r\nok");
        assert!(matches!(p.poll(), Ok(Async::Ready(Some(_)))));
        let resp = p.into_codec().into_response().unwrap();
        assert_eq!(resp.header("connection"), Some(&b"keep-alive, x-trace"[..]));
        assert_eq!(resp.header("x-trace"), Some(&b"1"[..]));
        assert_eq!(resp.header("content-length"), Some(&b"2"[..]));
        assert_eq!(resp.body(), b"ok");
    }

    #[test]
    fn invalid_connection_header() {
        let mock = MockData::new();
        let mut p = parser(&mock, false, 1024);
        mock.add_input(&b"HTTP/1.1 200 OK\r\nConnection: \xff\r\n\r\n"[..]);
        assert!(matches!(p.poll(), Err(Error::ConnectionInvalid)));
    }

    #[test]
    fn too_long() {
        let mock = MockData::new();
        let mut p = parser(&mock, false, 4);
        mock.add_input("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n");
        assert!(matches!(p.poll(), Err(Error::ResponseBodyTooLong)));
    }

    #[test]
    fn duplicate_content_length() {
        let mock = MockData::new();
        let mut p = parser(&mock, false, 1024);
        mock.add_input("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\
                        Content-Length: 5\r\n\r\n");
        assert!(matches!(p.poll(), Err(Error::DuplicateContentLength)));
    }

    #[test]
    fn bad_status_line() {
        let mock = MockData::new();
        let mut p = parser(&mock, false, 1024);
        mock.add_input("HTTX/1.1 200 OK\r\n\r\n");
        assert!(matches!(p.poll(), Err(Error::Header(_))));
    }
}
