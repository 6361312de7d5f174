mod connection;
mod error;
pub mod http;
mod uri;
mod user_agent;

pub use error::NetworkError;
pub use http::{Headers, Method, Request, Response, Status};
pub use uri::Uri;

use connection::Connection;
use log::{debug, warn};
use std::time::Duration;

/// Per-request options: extra or overriding headers and a cookie string.
/// Headers set here replace the defaults of the same name, including the
/// rotated User-Agent.
#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    pub headers: Vec<(String, String)>,
    pub cookies: Option<String>,
}

/// HTTP client for crawling: rotating User-Agent, bounded retries with
/// backoff, bounded redirect following. One connection per request.
pub struct Fetcher {
    timeout: Duration,
    max_redirects: usize,
    max_retries: usize,
}

impl Fetcher {
    pub fn new(timeout: Duration, max_redirects: usize, max_retries: usize) -> Self {
        Self {
            timeout,
            max_redirects,
            max_retries,
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<Response, NetworkError> {
        self.fetch_with(url, &FetchOptions::default()).await
    }

    pub async fn fetch_with(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<Response, NetworkError> {
        let mut last_error = None;

        for attempt in 0..self.max_retries.max(1) {
            match self.fetch_once(url, options).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if attempt + 1 < self.max_retries.max(1) {
                        let delay = Duration::from_millis(100 * (1 << attempt));
                        warn!(target: "network", "request for {} failed (attempt {}): {}; retrying in {:?}",
                            url, attempt + 1, e, delay);
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(NetworkError::InvalidUri))
    }

    async fn fetch_once(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<Response, NetworkError> {
        let mut current = url.to_string();

        for _ in 0..self.max_redirects.max(1) {
            let uri = Uri::parse(&current)?;
            debug!(target: "network", "GET {}", uri);

            let mut connection = tokio::time::timeout(self.timeout, Connection::connect(&uri))
                .await
                .map_err(|_| NetworkError::Timeout("Connection timed out".to_string()))??;

            let mut builder = Request::new()
                .method(Method::GET)
                .target(uri.request_target())
                .header("Host", uri.host())
                .header("Connection", "close")
                .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
                .header("Accept-Encoding", "gzip, deflate, identity")
                .header("Accept-Language", "en-US,en;q=0.9");

            if let Some(cookies) = options.cookies.as_deref() {
                if !cookies.is_empty() {
                    builder = builder.header("Cookie", cookies);
                }
            }
            for (name, value) in &options.headers {
                builder = builder.header(name.clone(), value.clone());
            }
            if !builder.has_header("user-agent") {
                builder = builder.header("User-Agent", user_agent::next_user_agent());
            }

            let request = builder.build()?;
            let response = tokio::time::timeout(self.timeout, connection.send_request(&request))
                .await
                .map_err(|_| NetworkError::Timeout("Request timed out".to_string()))??;

            if response.status.is_redirect() {
                if let Some(location) = response.headers.get("location") {
                    current = uri.resolve_reference(location)?;
                    debug!(target: "network", "redirected to {}", current);
                    continue;
                }
            }
            return Ok(response);
        }

        Err(NetworkError::TooManyRedirects)
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), 10, 3)
    }
}
