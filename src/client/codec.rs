use client::{Error, Head};


/// Receiving side of a single request-response exchange
///
/// The parser calls `headers_received` once the final response head is
/// received (interim `1xx` responses are skipped), and then
/// `data_received` once with the whole body, when the body is read up to
/// the end. Response body is always buffered, and its size is limited by
/// `Config::max_response_length`.
pub trait Codec {
    /// Received headers of a response
    ///
    /// At this point we already extracted all the headers and other data
    /// that we need to ensure correctness of the protocol. If you need
    /// to handle some data from the headers you need to store them somewhere
    /// (for example on `self`) for further processing.
    fn headers_received(&mut self, headers: &Head) -> Result<(), Error>;

    /// The whole response body received
    fn data_received(&mut self, data: &[u8]) -> Result<(), Error>;
}
