use httparse::InvalidChunkSize;
use netbuf::Buf;

use chunked;


/// Kind of the response body as determined by the response headers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyKind {
    Fixed(u64),
    Chunked,
    Eof,
}

#[derive(Debug, Clone)]
pub enum BodyProgress {
    Fixed(usize), // bytes left
    Eof,
    Chunked(chunked::State),
}

impl BodyProgress {
    pub fn new(kind: BodyKind) -> BodyProgress {
        match kind {
            BodyKind::Fixed(x) => BodyProgress::Fixed(x as usize),
            BodyKind::Chunked => BodyProgress::Chunked(chunked::State::new()),
            BodyKind::Eof => BodyProgress::Eof,
        }
    }
    /// Returns useful number of bytes in buffer and "end" ("done") flag
    ///
    /// `eof` is true when the peer has closed its side of the connection.
    pub fn check_buf(&self, buf: &Buf, eof: bool) -> (usize, bool) {
        use self::BodyProgress::*;
        match *self {
            Fixed(x) if x <= buf.len() => (x, true),
            Fixed(_) => (buf.len(), false),
            Chunked(ref s) => (s.buffered(), s.is_done()),
            Eof => (buf.len(), eof),
        }
    }
    pub fn parse(&mut self, buf: &mut Buf) -> Result<(), InvalidChunkSize> {
        if let BodyProgress::Chunked(ref mut s) = *self {
            s.parse(buf)?;
        }
        Ok(())
    }
    pub fn consume(&mut self, buf: &mut Buf, n: usize) {
        use self::BodyProgress::*;
        buf.consume(n);
        match *self {
            Fixed(ref mut x) => {
                assert!(*x >= n);
                *x -= n;
            }
            Chunked(ref mut s) => s.consume(n),
            Eof => {}
        }
    }
}
