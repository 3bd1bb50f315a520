use std::slice::Iter as SliceIter;

use version::Version;


/// An outgoing request before it is serialized
///
/// This is what interceptors see and modify. Header names are compared
/// case-insensitively, order of headers is preserved on the wire.
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    path: String,
    version: Version,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

/// Iterator over request headers as `(name, value)` pairs
pub struct HeaderIter<'a> {
    iter: SliceIter<'a, (String, String)>,
}

impl Request {
    pub fn new(method: &str, path: &str, version: Version) -> Request {
        Request {
            method: method.to_string(),
            path: path.to_string(),
            version: version,
            headers: Vec::new(),
            body: None,
        }
    }
    /// A GET request without a body
    pub fn get(path: &str, version: Version) -> Request {
        Request::new("GET", path, version)
    }
    pub fn method(&self) -> &str {
        &self.method
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn version(&self) -> Version {
        self.version
    }
    pub fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }
    pub fn headers(&self) -> HeaderIter {
        HeaderIter { iter: self.headers.iter() }
    }
    /// First value of the header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|&&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, ref v)| &v[..])
    }
    pub fn contains_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
    /// Append a header, keeping existing ones of the same name
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }
    /// Replace all headers of the same name with a single one
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.remove_header(name);
        self.add_header(name, value);
    }
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|&(ref n, _)| !n.eq_ignore_ascii_case(name));
    }
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_ref().map(|x| &x[..])
    }
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = Some(body);
    }
}

impl<'a> Iterator for HeaderIter<'a> {
    type Item = (&'a str, &'a str);
    fn next(&mut self) -> Option<(&'a str, &'a str)> {
        self.iter.next().map(|&(ref n, ref v)| (&n[..], &v[..]))
    }
}
