use crate::networking::error::NetworkError;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Response {
    pub version: Version,
    pub status: Status,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Response {
    /// Body decoded as text. Bytes that are not valid UTF-8 are replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug)]
pub struct Request {
    method: Method,
    target: String,
    version: Version,
    headers: Headers,
    body: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    HEAD,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub code: u16,
    pub text: String,
}

impl Status {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.code, 301 | 302 | 303 | 307 | 308)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Request {
    pub fn new() -> RequestBuilder {
        RequestBuilder {
            method: None,
            target: None,
            headers: Headers::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let method = match self.method {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
        };
        let version = match self.version {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        };

        let mut out = Vec::new();
        out.extend(format!("{} {} {}\r\n", method, self.target, version).as_bytes());
        for (name, value) in self.headers.iter() {
            out.extend(format!("{}: {}\r\n", name, value).as_bytes());
        }
        out.extend(b"\r\n");
        out.extend(&self.body);
        out
    }
}

pub struct RequestBuilder {
    method: Option<Method>,
    target: Option<String>,
    headers: Headers,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.get(name).is_some()
    }

    pub fn build(self) -> Result<Request, NetworkError> {
        Ok(Request {
            method: self.method.ok_or(NetworkError::MissingMethod)?,
            target: self.target.ok_or(NetworkError::MissingUri)?,
            version: Version::Http11,
            headers: self.headers,
            body: Vec::new(),
        })
    }
}

/// Case-insensitive, multi-valued header map. Repeated headers such as
/// `Set-Cookie` keep every value.
#[derive(Debug, Clone, Default)]
pub struct Headers(HashMap<String, Vec<String>>);

impl Headers {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, name: String, value: String) {
        self.0.insert(name.to_lowercase(), vec![value]);
    }

    pub fn append(&mut self, name: String, value: String) {
        self.0.entry(name.to_lowercase()).or_default().push(value);
    }

    /// First value for the name, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.0.get(&name.to_lowercase()).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(name, values)| {
            values.iter().map(move |value| (name.as_str(), value.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_case_insensitive_and_multi_valued() {
        let mut headers = Headers::new();
        headers.append("Set-Cookie".to_string(), "a=1".to_string());
        headers.append("set-cookie".to_string(), "b=2".to_string());
        assert_eq!(headers.get("SET-COOKIE"), Some("a=1"));
        assert_eq!(headers.get_all("set-cookie").map(<[String]>::len), Some(2));

        headers.insert("Content-Type".to_string(), "text/html".to_string());
        headers.insert("content-type".to_string(), "text/plain".to_string());
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn request_line_and_headers_serialize() {
        let request = Request::new()
            .method(Method::GET)
            .target("/index.html")
            .header("Host", "example.com")
            .build()
            .expect("complete request");
        let bytes = request.to_bytes();
        let text = String::from_utf8(bytes).expect("ascii request");
        assert!(text.starts_with("GET /index.html HTTP/1.1\r\n"));
        assert!(text.contains("host: example.com\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn builder_requires_method_and_target() {
        assert!(matches!(
            Request::new().target("/").build(),
            Err(NetworkError::MissingMethod)
        ));
        assert!(matches!(
            Request::new().method(Method::GET).build(),
            Err(NetworkError::MissingUri)
        ));
    }
}
