pub fn is_transfer_encoding(val: &str) -> bool {
    val.eq_ignore_ascii_case("Transfer-Encoding")
}

pub fn is_content_length(val: &str) -> bool {
    val.eq_ignore_ascii_case("Content-Length")
}

pub fn is_connection(val: &str) -> bool {
    val.eq_ignore_ascii_case("Connection")
}

fn is_space(ch: u8) -> bool {
    matches!(ch, b'\r' | b'\n' | b' ' | b'\t')
}

// header value is byte sequence
// we need case insensitive comparison and strip out of the whitespace
fn is_token(val: &[u8], token: &[u8]) -> bool {
    let start = match val.iter().position(|&ch| !is_space(ch)) {
        Some(x) => x,
        None => return false,
    };
    let end = val.iter().rposition(|&ch| !is_space(ch))
        .map(|x| x + 1).unwrap_or(start);
    val[start..end].eq_ignore_ascii_case(token)
}

pub fn is_close(val: &[u8]) -> bool {
    is_token(val, b"close")
}

pub fn is_chunked(val: &[u8]) -> bool {
    is_token(val, b"chunked")
}

#[cfg(test)]
mod test {
    use super::{is_content_length, is_transfer_encoding, is_connection};
    use super::{is_chunked, is_close};

    #[test]
    fn test_content_len() {
        assert!(is_content_length("Content-Length"));
        assert!(is_content_length("content-length"));
        assert!(is_content_length("CONTENT-length"));
        assert!(!is_content_length("Content-Type"));
    }

    #[test]
    fn test_transfer_encoding() {
        assert!(is_transfer_encoding("Transfer-Encoding"));
        assert!(is_transfer_encoding("transfer-ENCODING"));
        assert!(!is_transfer_encoding("Transfer"));
    }

    #[test]
    fn test_connection() {
        assert!(is_connection("Connection"));
        assert!(is_connection("ConneCTION"));
        assert!(!is_connection("Connect"));
    }

    #[test]
    fn test_chunked() {
        assert!(is_chunked(b"chunked"));
        assert!(is_chunked(b"chuNKED"));
        assert!(is_chunked(b"   CHUNKED  "));
        assert!(!is_chunked(b"   CHUNKED 1 "));
        assert!(!is_chunked(b"gzip"));
        assert!(!is_chunked(b"   "));
    }

    #[test]
    fn test_close() {
        assert!(is_close(b"close"));
        assert!(is_close(b"clOSE"));
        assert!(is_close(b"   close   "));
        assert!(!is_close(b"Close  1 "));
        assert!(!is_close(b" xclose   "));
        assert!(!is_close(b"keep-alive"));
    }
}
