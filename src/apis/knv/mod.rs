//! KNV (pcbis.de) catalog provider.

pub mod book;
pub mod soap;

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use self::book::KnvBook;
use crate::app::ports::HttpClientPort;
use crate::config::{CatalogConfig, Credentials};
use crate::constants::KNV_PROVIDER;
use crate::error::{EnrichError, Result};
use crate::gateway::catalog_cache::CatalogCache;
use crate::pipeline::processing::catalog::{CatalogEnrichment, CatalogProvider, ProviderOutput};
use crate::types::{Record, RecordFailure, Stage};

/// Login state for one `process` call
enum Session {
    Closed,
    Open(String),
    /// Login was attempted and failed; not retried within the run
    Unavailable(String),
}

pub struct KnvProvider {
    http: Arc<dyn HttpClientPort>,
    endpoint: String,
    databases: Vec<String>,
    credentials: Option<Credentials>,
    cache: Option<CatalogCache>,
    no_description: String,
}

impl KnvProvider {
    pub fn new(http: Arc<dyn HttpClientPort>, config: &CatalogConfig, credentials: Option<Credentials>) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            databases: config.databases.clone(),
            credentials,
            cache: None,
            no_description: "Keine Beschreibung vorhanden!".to_string(),
        }
    }

    pub fn with_cache(mut self, cache: CatalogCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_no_description(mut self, text: impl Into<String>) -> Self {
        self.no_description = text.into();
        self
    }

    /// Cached article, or a fresh catalog read that is then cached
    async fn book(&self, isbn: &str, session: &mut Session) -> Result<KnvBook> {
        if isbn.is_empty() {
            return Err(EnrichError::MissingField("ISBN".to_string()));
        }
        if let Some(cache) = &self.cache {
            if let Some(book) = cache.get::<KnvBook>(isbn)? {
                return Ok(book);
            }
        }

        let session_id = self.ensure_session(session).await.map_err(|message| EnrichError::Catalog {
            isbn: isbn.to_string(),
            message,
        })?;
        let book = self.query(&session_id, isbn).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(isbn, &book) {
                warn!("Could not cache catalog data for {}: {}", isbn, e);
            }
        }
        Ok(book)
    }

    async fn ensure_session(&self, session: &mut Session) -> std::result::Result<String, String> {
        match session {
            Session::Open(id) => return Ok(id.clone()),
            Session::Unavailable(reason) => return Err(reason.clone()),
            Session::Closed => {}
        }

        match self.login().await {
            Ok(id) => {
                info!("Logged in to KNV catalog");
                *session = Session::Open(id.clone());
                Ok(id)
            }
            Err(reason) => {
                warn!("KNV login failed: {}", reason);
                *session = Session::Unavailable(reason.clone());
                Err(reason)
            }
        }
    }

    async fn login(&self) -> std::result::Result<String, String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| "no catalog credentials configured".to_string())?;
        let response = self.call(soap::login_envelope(credentials)).await?;
        soap::session_id(&response).ok_or_else(|| "login response carried no SessionID".to_string())
    }

    #[instrument(skip(self, session_id))]
    async fn query(&self, session_id: &str, isbn: &str) -> Result<KnvBook> {
        let catalog_error = |message: String| EnrichError::Catalog {
            isbn: isbn.to_string(),
            message,
        };
        counter!("bookrec_catalog_lookups_total").increment(1);
        let response = self
            .call(soap::search_envelope(session_id, isbn, &self.databases))
            .await
            .map_err(catalog_error)?;
        let article = soap::article_data(&response).ok_or_else(|| catalog_error("no record found".to_string()))?;
        debug!("Received {} bytes of article data", article.len());
        Ok(KnvBook::from_article_xml(&article))
    }

    async fn logout(&self, session_id: &str) {
        match self.call(soap::logout_envelope(session_id)).await {
            Ok(_) => debug!("Logged out of KNV catalog"),
            Err(e) => warn!("KNV logout failed: {}", e),
        }
    }

    /// One WSCall round trip; faults and non-2xx statuses become errors
    async fn call(&self, envelope: String) -> std::result::Result<String, String> {
        let resp = self.http.post(&self.endpoint, soap::CONTENT_TYPE, envelope).await?;
        let body = resp.text();
        if let Some(reason) = soap::fault(&body) {
            return Err(reason);
        }
        if !resp.is_success() {
            return Err(format!("catalog returned status {}", resp.status));
        }
        Ok(body)
    }
}

#[async_trait]
impl CatalogProvider for KnvProvider {
    fn name(&self) -> &'static str {
        KNV_PROVIDER
    }

    async fn process(&self, records: &[Record]) -> Result<ProviderOutput> {
        let mut session = Session::Closed;
        let mut output = ProviderOutput::default();

        for record in records {
            let mut record = record.clone();
            let isbn = record.isbn().to_string();

            // Built fresh for every record; a failed lookup contributes nothing
            let enrichment = match self.book(&isbn, &mut session).await {
                Ok(book) => book.enrichment(&record, &self.no_description),
                Err(e) => {
                    warn!("Catalog lookup failed for {}: {}", isbn, e);
                    output.failures.push(RecordFailure::new(&isbn, Stage::Catalog, &e));
                    CatalogEnrichment::default()
                }
            };

            enrichment.apply_to(&mut record);
            output.records.push(record);
        }

        if let Session::Open(id) = &session {
            self.logout(id).await;
        }
        Ok(output)
    }
}
