use crate::networking::error::NetworkError;
use std::fmt;

#[derive(Debug, Clone)]
pub struct Uri {
    scheme: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
}

impl Uri {
    pub fn parse(uri: &str) -> Result<Self, NetworkError> {
        let (scheme, remainder) = uri.split_once("://").ok_or(NetworkError::InvalidUri)?;
        if scheme != "http" && scheme != "https" {
            return Err(NetworkError::InvalidUri);
        }

        let (authority, rest) = remainder.split_once('/').unwrap_or((remainder, ""));
        if authority.is_empty() {
            return Err(NetworkError::InvalidUri);
        }

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => (
                host.to_string(),
                Some(port.parse().map_err(|_| NetworkError::InvalidUri)?),
            ),
            None => (authority.to_string(), None),
        };

        // Fragments never travel over the wire.
        let (path_and_query, _) = rest.split_once('#').unwrap_or((rest, ""));
        let (path, query) = path_and_query
            .split_once('?')
            .unwrap_or((path_and_query, ""));

        Ok(Self {
            scheme: scheme.to_string(),
            host,
            port,
            path: format!("/{}", path),
            query: (!query.is_empty()).then(|| query.to_string()),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Port to dial, falling back to the scheme default.
    pub fn effective_port(&self) -> u16 {
        self.port
            .unwrap_or(if self.scheme == "https" { 443 } else { 80 })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path plus query, as it appears on the request line.
    pub fn request_target(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    pub fn origin(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// Resolve a reference (redirect Location, image src, ...) against this
    /// URI, producing an absolute URL string.
    pub fn resolve_reference(&self, reference: &str) -> Result<String, NetworkError> {
        let reference = reference.trim();

        if reference.is_empty() || reference.starts_with('#') {
            return Ok(self.to_string());
        }
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Ok(reference.to_string());
        }
        // Scheme-relative: //cdn.example.com/x
        if let Some(rest) = reference.strip_prefix("//") {
            return Ok(format!("{}://{}", self.scheme, rest));
        }
        // Query-only: keep the path, swap the query.
        if let Some(query) = reference.strip_prefix('?') {
            let mut out = self.origin();
            out.push_str(&self.path);
            if !query.is_empty() {
                out.push('?');
                out.push_str(query);
            }
            return Ok(out);
        }
        // Absolute path.
        if reference.starts_with('/') {
            return Ok(format!("{}{}", self.origin(), reference));
        }

        // Relative path: resolve against this URI's directory.
        let combined = format!("{}{}", base_dir_of(&self.path), reference);
        Ok(format!("{}{}", self.origin(), normalize_path(&combined)))
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin(), self.request_target())
    }
}

/// Directory portion of a path, always ending in '/'.
fn base_dir_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    }
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_port_path_query() {
        let uri = Uri::parse("https://example.com:8443/a/b?x=1#frag").expect("parses");
        assert_eq!(uri.scheme(), "https");
        assert_eq!(uri.host(), "example.com");
        assert_eq!(uri.port(), Some(8443));
        assert_eq!(uri.path(), "/a/b");
        assert_eq!(uri.request_target(), "/a/b?x=1");
    }

    #[test]
    fn bare_host_gets_a_root_path() {
        let uri = Uri::parse("http://example.com").expect("parses");
        assert_eq!(uri.path(), "/");
        assert_eq!(uri.effective_port(), 80);
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(Uri::parse("ftp://example.com").is_err());
        assert!(Uri::parse("not a url").is_err());
    }

    #[test]
    fn resolves_references() {
        let base = Uri::parse("https://example.com/a/b/page.html").expect("parses");
        let resolve = |r| base.resolve_reference(r).expect("resolves");
        assert_eq!(resolve("/top"), "https://example.com/top");
        assert_eq!(resolve("img.png"), "https://example.com/a/b/img.png");
        assert_eq!(resolve("../up.png"), "https://example.com/a/up.png");
        assert_eq!(resolve("//cdn.example.com/x"), "https://cdn.example.com/x");
        assert_eq!(resolve("http://other.org/"), "http://other.org/");
        assert_eq!(resolve("?p=2"), "https://example.com/a/b/page.html?p=2");
    }
}
