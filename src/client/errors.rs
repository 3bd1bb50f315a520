use std::io;

use httparse::Error as HttpError;
use httparse::InvalidChunkSize;
use url::ParseError;

use serializer::HeaderError;


quick_error! {
    #[derive(Debug)]
    /// Client request error
    pub enum Error {
        /// Url can't be parsed
        InvalidUrl(err: ParseError) {
            description("invalid url")
            display("invalid url: {}", err)
            from()
        }
        /// Scheme url is not supported, only plain `http` is
        UnsupportedScheme {
            description("scheme of this url is not supported")
        }
        /// Host name resolved to no addresses
        NameNotFound {
            description("name not found")
        }
        /// I/O (basically networking) error occured during request
        Io(err: io::Error) {
            description("IO error")
            display("IO error: {}", err)
            from()
        }
        /// Bad response headers received
        Header(err: HttpError) {
            description("bad headers")
            display("bad headers: {}", err)
            from()
        }
        /// Bad chunk size received
        ChunkSize(err: InvalidChunkSize) {
            description("invalid chunk size")
            display("invalid chunk size: {}", err)
            from()
        }
        /// Request can't be serialized
        Serialize(err: HeaderError) {
            description("can't serialize request")
            display("can't serialize request: {}", err)
            from()
        }
        /// Bad `Content-Length` header
        BadContentLength {
            description("bad content length")
        }
        /// Duplicate `Content-Length` header
        DuplicateContentLength {
            description("duplicate content length")
        }
        /// `Connection` header is not valid utf-8
        ConnectionInvalid {
            description("invalid connection header")
        }
        /// Response body exceeds `Config::max_response_length`
        ResponseBodyTooLong {
            description("response body is too long")
        }
        /// Connection reset by peer when reading response headers
        ResetOnResponseHeaders {
            description("connection closed prematurely while reading headers")
        }
        /// Connection reset by peer when response body
        ResetOnResponseBody {
            description("connection closed prematurely while reading body")
        }
        /// Response headers are received while we had no request sent yet
        PrematureResponseHeaders {
            description("response headers received \
                         before request has been written")
        }
        /// Nothing was read or written for `Config::socket_timeout`
        Timeout {
            description("socket timed out")
        }
        /// Connection closed by peer before it could be used
        Closed {
            description("connection closed")
        }
        /// Body length header is set on request before the content
        /// interceptor is run
        FramingHeaderPresent {
            description("Content-Length or Transfer-Encoding header \
                         is already present")
        }
        /// No host to put into `Host` header of HTTP/1.1 request
        TargetHostMissing {
            description("target host missing")
        }
        /// Error returned by a response handler
        Handler(message: String) {
            description("response handler failed")
            display("response handler failed: {}", message)
        }
    }
}
