use crate::app::ports::HttpClientPort;
use crate::error::{EnrichError, Result};
use metrics::counter;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverOutcome {
    /// A file for this book was already on disk; nothing was requested
    AlreadyPresent,
    Downloaded,
    /// Downloads are switched off and no file exists
    Skipped,
}

impl CoverOutcome {
    pub fn has_cover(self) -> bool {
        matches!(self, CoverOutcome::AlreadyPresent | CoverOutcome::Downloaded)
    }
}

/// Downloads cover images keyed by ISBN into the image directory
pub struct CoverFetcher {
    http: Arc<dyn HttpClientPort>,
    endpoint: String,
    images_dir: PathBuf,
    enabled: bool,
}

impl CoverFetcher {
    pub fn new(http: Arc<dyn HttpClientPort>, endpoint: impl Into<String>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            images_dir: images_dir.into(),
            enabled: true,
        }
    }

    pub fn with_downloads(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn cover_url(&self, isbn: &str) -> String {
        format!("{}?isbn={}", self.endpoint, isbn)
    }

    /// `{images}/{file_stem}.jpg`, falling back to the ISBN for an empty stem
    pub fn cover_path(&self, isbn: &str, file_stem: &str) -> PathBuf {
        let stem = if file_stem.is_empty() { isbn } else { file_stem };
        self.images_dir.join(format!("{stem}.jpg"))
    }

    #[instrument(skip(self))]
    pub async fn fetch(&self, isbn: &str, file_stem: &str) -> Result<CoverOutcome> {
        let path = self.cover_path(isbn, file_stem);
        if path.exists() {
            debug!("Book cover for {} already exists, skipping", isbn);
            return Ok(CoverOutcome::AlreadyPresent);
        }
        if !self.enabled {
            return Ok(CoverOutcome::Skipped);
        }

        let url = self.cover_url(isbn);
        let referer = self.referer();
        let resp = self
            .http
            .get(&url, &[("Referer", referer.as_str())])
            .await
            .map_err(|message| EnrichError::Api { message })?;

        if !resp.is_success() {
            return Err(EnrichError::Api {
                message: format!("cover request for {} returned status {}", isbn, resp.status),
            });
        }
        if resp.bytes.is_empty() {
            return Err(EnrichError::Api {
                message: format!("cover request for {} returned an empty body", isbn),
            });
        }

        fs::create_dir_all(&self.images_dir)?;
        fs::write(&path, &resp.bytes)?;
        counter!("bookrec_covers_downloaded_total").increment(1);
        info!("Downloaded cover for {} to {}", isbn, path.display());
        Ok(CoverOutcome::Downloaded)
    }

    // scheme://host of the endpoint
    fn referer(&self) -> String {
        reqwest::Url::parse(&self.endpoint)
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_else(|_| self.endpoint.clone())
    }
}
