pub mod dom;
pub mod extract;
pub mod html;
pub mod logger;
pub mod media;
pub mod networking;
pub mod selector;

pub use dom::{Attribute, DomTree, Node, NodeType};
pub use extract::{Recipe, Record};
pub use networking::{FetchOptions, Fetcher, NetworkError, Response};
pub use selector::{AttrConstraint, MatchSpec, Matches, Pattern, SelectorError};

use log::{debug, info};
use std::time::Duration;

#[derive(Clone)]
pub struct ScraperConfig {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub max_retries: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            max_retries: 3,
        }
    }
}

/// Facade tying the pipeline together: fetch a page, parse it into a DOM,
/// and hand the tree to selectors and recipes.
pub struct Scraper {
    fetcher: Fetcher,
}

impl Scraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            fetcher: Fetcher::new(config.timeout, config.max_redirects, config.max_retries),
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Fetch a URL and return the raw response.
    pub async fn fetch(&self, url: &str) -> Result<Response, NetworkError> {
        self.fetcher.fetch(url).await
    }

    /// Fetch with per-request options (extra headers, cookies).
    pub async fn fetch_with(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<Response, NetworkError> {
        self.fetcher.fetch_with(url, options).await
    }

    /// Fetch a URL and parse its body into a document tree. A non-success
    /// final status fails instead of parsing an error page.
    pub async fn load_document(&self, url: &str) -> Result<DomTree, NetworkError> {
        self.load_document_with(url, &FetchOptions::default()).await
    }

    pub async fn load_document_with(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<DomTree, NetworkError> {
        let response = self.fetcher.fetch_with(url, options).await?;
        if !response.status.is_success() {
            return Err(NetworkError::HttpStatus(response.status.code));
        }
        info!(target: "scraper", "fetched {} ({} bytes)", url, response.body.len());

        let body = response.text();
        debug!(target: "scraper", "parsing {} chars of markup", body.len());
        Ok(html::parse(&body))
    }
}

impl Default for Scraper {
    fn default() -> Self {
        Self::new(ScraperConfig::default())
    }
}
