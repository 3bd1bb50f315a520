use httparse::{InvalidChunkSize, parse_chunk_size};
use netbuf::Buf;


/// Decoder of the chunked transfer encoding
///
/// Chunk headers are removed from the buffer in place, so the decoded data
/// always occupies `buf[..buffered]`.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    buffered: usize,
    pending: usize,
    trailer: bool,
    done: bool,
}

impl State {
    pub fn new() -> State {
        State {
            buffered: 0,
            pending: 0,
            trailer: false,
            done: false,
        }
    }
    pub fn parse(&mut self, buf: &mut Buf) -> Result<(), InvalidChunkSize> {
        let State {
            ref mut buffered, ref mut pending, ref mut trailer, ref mut done,
        } = *self;
        while !*done && *buffered < buf.len() {
            if *trailer {
                // Trailer fields are skipped line by line until an empty one
                let line = match buf[*buffered..].windows(2)
                    .position(|w| w == &b"\r\n"[..])
                {
                    Some(x) => x,
                    None => return Ok(()),
                };
                buf.remove_range(*buffered..*buffered+line+2);
                if line == 0 {
                    *done = true;
                }
            } else if *pending == 0 {
                use httparse::Status::*;
                match parse_chunk_size(&buf[*buffered..])? {
                    Complete((bytes, 0)) => {
                        buf.remove_range(*buffered..*buffered+bytes);
                        *trailer = true;
                    }
                    Complete((bytes, chunk_size)) => {
                        buf.remove_range(*buffered..*buffered+bytes);
                        *pending = chunk_size as usize;
                    }
                    Partial => {
                        return Ok(());
                    }
                }
            } else if *buffered + *pending + 2 <= buf.len() {
                *buffered += *pending;
                *pending = 0;
                // chunk data is followed by CRLF
                buf.remove_range(*buffered..*buffered+2);
            } else if *buffered + *pending <= buf.len() {
                // whole chunk is here but CRLF isn't yet
                return Ok(());
            } else {
                *pending -= buf.len() - *buffered;
                *buffered = buf.len();
            }
        }
        Ok(())
    }
    pub fn buffered(&self) -> usize {
        self.buffered
    }
    pub fn is_done(&self) -> bool {
        self.done
    }
    pub fn consume(&mut self, n: usize) {
        assert!(self.buffered >= n);
        self.buffered -= n;
    }
}
