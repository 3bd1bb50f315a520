use netbuf::Buf;

use client::{Error, Request};
use headers;
use serializer::MessageState;


/// Writes request into the output buffer
///
/// Body length headers put on the request by interceptors are routed
/// through the framing-aware methods of the serializer, so a request
/// with conflicting or lying framing is never sent. On error nothing is
/// left in the buffer.
pub fn write_request(buf: &mut Buf, request: &Request) -> Result<(), Error> {
    let start = buf.len();
    let result = write_message(buf, request);
    if result.is_err() {
        buf.remove_range(start..);
    }
    result
}

fn write_message(buf: &mut Buf, request: &Request) -> Result<(), Error> {
    let mut message = MessageState::RequestStart;
    message.request_line(buf,
        request.method(), request.path(), request.version());
    let mut declared = None;
    for (name, value) in request.headers() {
        if headers::is_content_length(name) {
            let len = value.trim().parse()
                .map_err(|_| Error::BadContentLength)?;
            message.add_length(buf, len)?;
            declared = Some(len);
        } else if headers::is_transfer_encoding(name) {
            if !headers::is_chunked(value.as_bytes()) {
                return Err(Error::BadContentLength);
            }
            message.add_chunked(buf)?;
        } else {
            message.add_header(buf, name, value)?;
        }
    }
    let body = request.body().unwrap_or(&b""[..]);
    match declared {
        Some(len) if len != body.len() as u64 => {
            return Err(Error::BadContentLength);
        }
        _ => {}
    }
    message.done_headers(buf);
    if !body.is_empty() {
        if let MessageState::FixedBody { content_length: 0 } = message {
            // no length header, the body can't be framed
            return Err(Error::BadContentLength);
        }
        message.write_body(buf, body);
    }
    message.done(buf);
    Ok(())
}

#[cfg(test)]
mod test {
    use netbuf::Buf;

    use client::{Error, Request};
    use version::Version;
    use super::write_request;

    fn encode(req: &Request) -> Result<String, Error> {
        let mut buf = Buf::new();
        buf.extend(b"previous");
        let result = write_request(&mut buf, req);
        let text = String::from_utf8_lossy(&buf[..]).to_string();
        result.map(|()| text[8..].to_string())
            .map_err(|e| { assert_eq!(text, "previous"); e })
    }

    #[test]
    fn plain_get() {
        let mut req = Request::get("/index.html", Version::Http11);
        req.add_header("Host", "example.com");
        assert_eq!(encode(&req).unwrap(),
            "GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n");
    }

    #[test]
    fn fixed_body() {
        let mut req = Request::new("POST", "/", Version::Http11);
        req.add_header("Content-Length", "5");
        req.set_body(b"hello".to_vec());
        assert_eq!(encode(&req).unwrap(),
            "POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");
    }

    #[test]
    fn chunked_body() {
        let mut req = Request::new("POST", "/", Version::Http11);
        req.add_header("Transfer-Encoding", "chunked");
        req.set_body(b"hello".to_vec());
        assert_eq!(encode(&req).unwrap(),
            "POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n\
             5\r\nhello\r\n0\r\n\r\n");
    }

    #[test]
    fn length_mismatch() {
        let mut req = Request::new("POST", "/", Version::Http11);
        req.add_header("Content-Length", "3");
        req.set_body(b"hello".to_vec());
        assert!(matches!(encode(&req), Err(Error::BadContentLength)));
    }

    #[test]
    fn unframed_body() {
        let mut req = Request::new("POST", "/", Version::Http11);
        req.set_body(b"hello".to_vec());
        assert!(matches!(encode(&req), Err(Error::BadContentLength)));
    }

    #[test]
    fn duplicate_length() {
        let mut req = Request::new("POST", "/", Version::Http11);
        req.add_header("Content-Length", "0");
        req.add_header("Content-Length", "0");
        assert!(matches!(encode(&req), Err(Error::Serialize(_))));
    }

    #[test]
    fn invalid_header() {
        let mut req = Request::get("/", Version::Http11);
        req.add_header("X-Bad", "a\r\nb");
        assert!(matches!(encode(&req), Err(Error::Serialize(_))));
    }
}
