//! Download images (or any binary resource) discovered while scraping.

use crate::networking::{Fetcher, NetworkError};
use log::{info, warn};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub enum MediaError {
    Network(NetworkError),
    Io(std::io::Error),
}

impl std::error::Error for MediaError {}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Network(e) => write!(f, "Download failed: {}", e),
            MediaError::Io(e) => write!(f, "Could not store download: {}", e),
        }
    }
}

impl From<NetworkError> for MediaError {
    fn from(e: NetworkError) -> Self {
        MediaError::Network(e)
    }
}

impl From<std::io::Error> for MediaError {
    fn from(e: std::io::Error) -> Self {
        MediaError::Io(e)
    }
}

/// Download one URL into `directory`, returning the number of bytes written.
/// The file name and extension are inferred from the URL path unless `name`
/// overrides the stem. The directory is created on demand.
pub async fn download_image(
    fetcher: &Fetcher,
    url: &str,
    directory: &Path,
    name: Option<&str>,
) -> Result<usize, MediaError> {
    let (stem, extension) = infer_file_name(url);
    let stem = name.unwrap_or(&stem);

    fs::create_dir_all(directory)?;

    let response = fetcher.fetch(url).await?;
    if !response.status.is_success() {
        return Err(NetworkError::HttpStatus(response.status.code).into());
    }

    let path = directory.join(format!("{}.{}", stem, extension));
    fs::write(&path, &response.body)?;
    info!(target: "media", "saved {} ({} bytes)", path.display(), response.body.len());
    Ok(response.body.len())
}

/// Download a batch of URLs. With `rename` set, files are named by their
/// zero-padded position instead of the URL stem. Failures are logged and
/// skipped; returns how many files were written.
pub async fn download_images(
    fetcher: &Fetcher,
    urls: &[&str],
    directory: &Path,
    rename: bool,
) -> usize {
    let mut saved = 0;
    for (index, url) in urls.iter().enumerate() {
        let name = rename.then(|| format!("{:03}", index + 1));
        match download_image(fetcher, url, directory, name.as_deref()).await {
            Ok(_) => saved += 1,
            Err(e) => warn!(target: "media", "skipping {}: {}", url, e),
        }
    }
    saved
}

/// Best-effort `(stem, extension)` from a URL path; falls back to
/// `("image", "png")` when the last segment has no usable extension.
fn infer_file_name(url: &str) -> (String, String) {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or("");

    if let Some((stem, extension)) = segment.rsplit_once('.') {
        let stem: String = stem
            .chars()
            .filter(|ch| ch.is_alphanumeric() || *ch == '_' || *ch == '-')
            .collect();
        let extension_ok = (3..=4).contains(&extension.len())
            && extension.chars().all(|ch| ch.is_ascii_alphabetic());
        if !stem.is_empty() && extension_ok {
            return (stem, extension.to_ascii_lowercase());
        }
    }
    ("image".to_string(), "png".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_name_and_extension_from_the_url_path() {
        assert_eq!(
            infer_file_name("https://example.com/img/photo.JPG?size=big"),
            ("photo".to_string(), "jpg".to_string())
        );
        assert_eq!(
            infer_file_name("https://example.com/a/cover-1.webp"),
            ("cover-1".to_string(), "webp".to_string())
        );
    }

    #[test]
    fn falls_back_when_nothing_usable_is_present() {
        assert_eq!(
            infer_file_name("https://example.com/gallery/"),
            ("image".to_string(), "png".to_string())
        );
        assert_eq!(
            infer_file_name("https://example.com/x.toolong1"),
            ("image".to_string(), "png".to_string())
        );
    }
}
