use crate::networking::{error::NetworkError, http, uri::Uri};
use flate2::read::{DeflateDecoder, GzDecoder};
use log::{debug, warn};
use rustls::pki_types::ServerName;
use std::io::Read;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

// Safety cap for decoded bodies.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;
const READ_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

enum Stream {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

/// A single-request connection: connects, sends, reads the full response.
/// Every request carries `Connection: close`, so end-of-body is always
/// detectable (Content-Length, chunked terminator, or EOF).
pub struct Connection {
    stream: Stream,
}

impl Connection {
    pub async fn connect(uri: &Uri) -> Result<Self, NetworkError> {
        let addr = format!("{}:{}", uri.host(), uri.effective_port());
        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        let stream = if uri.scheme() == "https" {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            let config = ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth();
            let connector = TlsConnector::from(Arc::new(config));
            let server_name = ServerName::try_from(uri.host().to_string())
                .map_err(|e| NetworkError::TlsError(e.to_string()))?;
            let tls = connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| NetworkError::TlsError(e.to_string()))?;
            Stream::Tls(Box::new(tls))
        } else {
            Stream::Plain(tcp)
        };

        Ok(Self { stream })
    }

    pub async fn send_request(
        &mut self,
        request: &http::Request,
    ) -> Result<http::Response, NetworkError> {
        let bytes = request.to_bytes();
        match &mut self.stream {
            Stream::Plain(stream) => stream
                .write_all(&bytes)
                .await
                .map_err(|e| NetworkError::SendFailed(e.to_string()))?,
            Stream::Tls(stream) => stream
                .write_all(&bytes)
                .await
                .map_err(|e| NetworkError::SendFailed(e.to_string()))?,
        }

        let raw = self.read_response().await?;
        if raw.is_empty() {
            return Err(NetworkError::ReceiveFailed("Empty response".to_string()));
        }
        parse_response(&raw)
    }

    /// Read until the response is complete: full headers, then a body bounded
    /// by Content-Length, the chunked terminator, or connection EOF.
    async fn read_response(&mut self) -> Result<Vec<u8>, NetworkError> {
        let mut data = Vec::new();
        let mut buffer = [0u8; 8192];

        let header_end = loop {
            let n = self.read_some(&mut buffer).await?;
            if n == 0 {
                break find_header_end(&data).unwrap_or(data.len());
            }
            data.extend_from_slice(&buffer[..n]);
            if let Some(end) = find_header_end(&data) {
                break end;
            }
        };

        let plan = body_plan(&data[..header_end]);
        loop {
            let done = match plan {
                BodyPlan::Length(len) => data.len() >= header_end + len,
                BodyPlan::Chunked => chunked_complete(&data[header_end..]),
                BodyPlan::UntilEof => false,
            };
            if done || data.len() > MAX_BODY_BYTES {
                break;
            }
            let n = self.read_some(&mut buffer).await?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buffer[..n]);
        }

        Ok(data)
    }

    async fn read_some(&mut self, buffer: &mut [u8]) -> Result<usize, NetworkError> {
        let read = async {
            match &mut self.stream {
                Stream::Plain(stream) => stream
                    .read(buffer)
                    .await
                    .map_err(|e| NetworkError::ReceiveFailed(e.to_string())),
                Stream::Tls(stream) => match stream.read(buffer).await {
                    Ok(n) => Ok(n),
                    // A missing close_notify is an ordinary EOF for HTTP.
                    Err(e) if e.to_string().contains("close_notify") => Ok(0),
                    Err(e) => Err(NetworkError::ReceiveFailed(e.to_string())),
                },
            }
        };
        tokio::time::timeout(READ_TIMEOUT, read)
            .await
            .map_err(|_| NetworkError::Timeout("Read timed out".to_string()))?
    }
}

#[derive(Clone, Copy)]
enum BodyPlan {
    Length(usize),
    Chunked,
    UntilEof,
}

fn body_plan(header_bytes: &[u8]) -> BodyPlan {
    let header_str = String::from_utf8_lossy(header_bytes);
    let mut content_length = None;
    let mut chunked = false;

    for line in header_str.split("\r\n").skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        match name.trim().to_lowercase().as_str() {
            "content-length" => content_length = value.trim().parse().ok(),
            "transfer-encoding" => {
                chunked = value
                    .split(',')
                    .any(|v| v.trim().eq_ignore_ascii_case("chunked"));
            }
            _ => {}
        }
    }

    if chunked {
        BodyPlan::Chunked
    } else if let Some(len) = content_length {
        BodyPlan::Length(len)
    } else {
        BodyPlan::UntilEof
    }
}

fn parse_response(data: &[u8]) -> Result<http::Response, NetworkError> {
    let header_end = find_header_end(data).ok_or_else(|| {
        NetworkError::ParseError("Missing header terminator (\\r\\n\\r\\n)".to_string())
    })?;

    let header_str = String::from_utf8_lossy(&data[..header_end]);
    let mut lines = header_str.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| NetworkError::ParseError("Empty response".to_string()))?;
    let mut parts = status_line.split_whitespace();
    let version = match parts.next() {
        Some("HTTP/1.1") => http::Version::Http11,
        Some("HTTP/1.0") => http::Version::Http10,
        _ => return Err(NetworkError::ParseError("Invalid HTTP version".to_string())),
    };
    let code = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| NetworkError::ParseError("Invalid status code".to_string()))?;
    let text = parts.collect::<Vec<_>>().join(" ");

    let mut headers = http::Headers::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        let (name, value) = line.split_once(':').ok_or_else(|| {
            NetworkError::ParseError(format!("Invalid header line: {line}"))
        })?;
        headers.append(name.trim().to_string(), value.trim().to_string());
    }

    let mut body = data[header_end..].to_vec();
    if is_chunked(&headers) {
        body = decode_chunked(&body)?;
    } else if let Some(len) = headers.get("content-length").and_then(|v| v.parse().ok()) {
        if body.len() >= len {
            body.truncate(len);
        }
    }
    body = decompress(&headers, body);

    Ok(http::Response {
        version,
        status: http::Status { code, text },
        headers,
        body,
    })
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|idx| idx + 4)
}

fn is_chunked(headers: &http::Headers) -> bool {
    headers.get("transfer-encoding").is_some_and(|te| {
        te.split(',')
            .any(|v| v.trim().eq_ignore_ascii_case("chunked"))
    })
}

/// True once the terminating zero-size chunk has arrived.
fn chunked_complete(body: &[u8]) -> bool {
    body.ends_with(b"0\r\n\r\n")
        || body
            .windows(7)
            .any(|window| window == b"\r\n0\r\n\r\n")
}

/// Strip chunked framing. Truncated input yields the chunks received so far
/// rather than an error; chunk-size lines must never leak into the body.
fn decode_chunked(input: &[u8]) -> Result<Vec<u8>, NetworkError> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < input.len() {
        let Some(line_end) = find_crlf(input, i) else {
            warn!(target: "network", "chunked body truncated mid size line");
            break;
        };
        let size_line = String::from_utf8_lossy(&input[i..line_end]);
        // Chunk extensions ("<hex>;ext") are allowed and ignored.
        let size_field = size_line.split(';').next().unwrap_or("").trim().to_string();
        i = line_end + 2;

        if size_field.is_empty() {
            continue;
        }
        let Ok(size) = usize::from_str_radix(&size_field, 16) else {
            debug!(target: "network", "invalid chunk size {:?}, stopping", size_field);
            break;
        };
        if size == 0 {
            break;
        }
        if out.len().saturating_add(size) > MAX_BODY_BYTES {
            return Err(NetworkError::TooLargeResponse);
        }

        let end = (i + size).min(input.len());
        out.extend_from_slice(&input[i..end]);
        if end < i + size {
            warn!(target: "network", "chunked body truncated mid chunk");
            break;
        }
        i = end;
        if input.get(i..i + 2) == Some(b"\r\n") {
            i += 2;
        }
    }

    Ok(out)
}

fn find_crlf(buf: &[u8], start: usize) -> Option<usize> {
    buf[start..]
        .windows(2)
        .position(|window| window == b"\r\n")
        .map(|idx| start + idx)
}

/// Undo Content-Encoding. Servers sometimes lie about the encoding, so a
/// failed decode falls back to the raw bytes instead of failing the fetch.
fn decompress(headers: &http::Headers, body: Vec<u8>) -> Vec<u8> {
    let Some(encoding) = headers.get("content-encoding") else {
        return body;
    };
    if body.is_empty() {
        return body;
    }

    match encoding.trim().to_lowercase().as_str() {
        "gzip" | "x-gzip" => {
            if body.len() < 2 || body[0] != 0x1f || body[1] != 0x8b {
                warn!(target: "network", "gzip encoding without gzip magic bytes");
                return body;
            }
            let mut decoded = Vec::new();
            match GzDecoder::new(&body[..]).read_to_end(&mut decoded) {
                Ok(_) => decoded,
                Err(e) => {
                    warn!(target: "network", "gzip decode failed: {}", e);
                    body
                }
            }
        }
        "deflate" => {
            let mut decoded = Vec::new();
            match DeflateDecoder::new(&body[..]).read_to_end(&mut decoded) {
                Ok(_) => decoded,
                Err(e) => {
                    warn!(target: "network", "deflate decode failed: {}", e);
                    body
                }
            }
        }
        "identity" | "" => body,
        other => {
            warn!(target: "network", "unknown content-encoding {:?}", other);
            body
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_response() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 5\r\n\r\nhello";
        let response = parse_response(raw).expect("parses");
        assert_eq!(response.status.code, 200);
        assert!(response.status.is_success());
        assert_eq!(response.headers.get("content-type"), Some("text/html"));
        assert_eq!(response.body, b"hello");
    }

    #[test]
    fn repeated_set_cookie_headers_are_kept() {
        let raw = b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\nContent-Length: 0\r\n\r\n";
        let response = parse_response(raw).expect("parses");
        assert_eq!(
            response.headers.get_all("set-cookie").map(<[String]>::len),
            Some(2)
        );
    }

    #[test]
    fn decodes_chunked_framing() {
        let body = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        assert_eq!(decode_chunked(body).expect("decodes"), b"Wikipedia");
        assert!(chunked_complete(body));
        assert!(!chunked_complete(b"4\r\nWiki\r\n"));
    }

    #[test]
    fn chunk_extensions_are_ignored() {
        let body = b"4;name=x\r\nWiki\r\n0\r\n\r\n";
        assert_eq!(decode_chunked(body).expect("decodes"), b"Wiki");
    }

    #[test]
    fn truncated_chunked_body_keeps_received_data() {
        let body = b"a\r\nWikipedia!\r\n5\r\nmo";
        assert_eq!(decode_chunked(body).expect("decodes"), b"Wikipedia!mo");
    }

    #[test]
    fn malformed_status_lines_are_rejected() {
        assert!(parse_response(b"HTTP/2 200 OK\r\n\r\n").is_err());
        assert!(parse_response(b"garbage\r\n\r\n").is_err());
    }
}
