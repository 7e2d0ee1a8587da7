// Pipeline: CSV in → local enrichment → catalog provider → CSV out

pub mod csv_bridge;
pub mod processing;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::apis::cover::CoverFetcher;
use crate::apis::knv::KnvProvider;
use crate::config::Config;
use crate::constants::BROWSER_USER_AGENT;
use crate::error::{EnrichError, Result};
use crate::gateway::catalog_cache::CatalogCache;
use crate::infra::http_client::ReqwestHttp;
use crate::language::Translations;
use crate::types::{Field, Record, RecordFailure, Stage};
use self::csv_bridge::CsvBridge;
use self::processing::catalog::ProviderRegistry;
use self::processing::RecordEnricher;

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub input_file: String,
    pub output_file: String,
    pub total_records: usize,
    pub enriched_records: usize,
    pub written_records: usize,
    /// The catalog provider whose output was written, if any delivered
    pub provider: Option<String>,
    pub failures: Vec<RecordFailure>,
}

impl RunReport {
    fn new(input: &Path, output: &Path) -> Self {
        Self {
            started_at: Utc::now(),
            input_file: input.display().to_string(),
            output_file: output.display().to_string(),
            total_records: 0,
            enriched_records: 0,
            written_records: 0,
            provider: None,
            failures: Vec::new(),
        }
    }
}

pub struct Pipeline {
    reader: CsvBridge,
    writer: CsvBridge,
    enricher: RecordEnricher,
    providers: ProviderRegistry,
}

impl Pipeline {
    pub fn new(reader: CsvBridge, writer: CsvBridge, enricher: RecordEnricher, providers: ProviderRegistry) -> Self {
        Self {
            reader,
            writer,
            enricher,
            providers,
        }
    }

    /// Wires the reqwest-backed cover fetcher and the KNV provider
    pub fn from_config(config: &Config, translations: Arc<Translations>) -> Result<Self> {
        let delimiter = config.csv.delimiter_byte()?;

        let cover_http = Arc::new(ReqwestHttp::new(config.cover.timeout(), &config.cover.user_agent)?);
        let covers = CoverFetcher::new(cover_http, config.cover.endpoint.clone(), config.paths.images.clone())
            .with_downloads(config.cover.enabled);

        let mut providers = ProviderRegistry::new();
        if config.catalog.enabled {
            let catalog_http = Arc::new(ReqwestHttp::new(config.catalog.timeout(), BROWSER_USER_AGENT)?);
            let credentials = config.catalog.credentials()?;
            if credentials.is_none() {
                warn!("No KNV credentials found; only cached catalog entries can be used");
            }
            let knv = KnvProvider::new(catalog_http, &config.catalog, credentials)
                .with_cache(CatalogCache::new(config.paths.cache.clone()))
                .with_no_description(translations.no_description.clone());
            providers.register(Box::new(knv));
        }

        Ok(Self::new(
            CsvBridge::new(Field::INPUT_SCHEMA.to_vec(), delimiter),
            CsvBridge::new(Field::ALL.to_vec(), delimiter),
            RecordEnricher::new(translations, covers),
            providers,
        ))
    }

    /// Run the complete pipeline for one export file
    #[instrument(skip(self))]
    pub async fn run(&self, input: &Path, output: &Path) -> Result<RunReport> {
        let mut report = RunReport::new(input, output);
        info!("Reading {}", input.display());

        let read = match self.reader.read(input) {
            Ok(read) => read,
            Err(EnrichError::InputUnavailable(path)) => {
                warn!("Input {} is not readable, nothing to do", path.display());
                return Ok(report);
            }
            Err(e) => return Err(e),
        };
        report.total_records = read.records.len() + read.malformed.len();
        counter!("bookrec_records_read_total").increment(read.records.len() as u64);
        for e in read.malformed {
            warn!("Skipping row: {}", e);
            report.failures.push(RecordFailure::new("", Stage::Read, e));
        }

        let enriched = self.enrich_all(read.records, &mut report).await;
        report.enriched_records = enriched.len();
        if enriched.is_empty() {
            warn!("No records left to write");
            return Ok(report);
        }

        let records = match self.providers.select(&enriched).await {
            Some((name, output)) => {
                counter!("bookrec_catalog_failures_total").increment(output.failures.len() as u64);
                report.provider = Some(name.to_string());
                report.failures.extend(output.failures);
                output.records
            }
            None => {
                if !self.providers.is_empty() {
                    warn!(
                        "No catalog provider delivered ({}); writing locally enriched records",
                        self.providers.names().join(", ")
                    );
                }
                let mut records = enriched;
                records.iter_mut().for_each(Record::sort_canonical);
                records
            }
        };

        self.writer.write(&records, output).map_err(|e| {
            error!("Failed to write {}: {}", output.display(), e);
            e
        })?;
        report.written_records = records.len();
        info!(
            "Wrote {} records to {} ({} failures)",
            report.written_records,
            output.display(),
            report.failures.len()
        );
        Ok(report)
    }

    async fn enrich_all(&self, records: Vec<Record>, report: &mut RunReport) -> Vec<Record> {
        let total = records.len();
        let mut enriched = Vec::with_capacity(total);

        for (i, record) in records.into_iter().enumerate() {
            let isbn = record.isbn().to_string();
            match self.enricher.enrich(record).await {
                Ok(outcome) => {
                    if let Some(message) = outcome.cover_failure {
                        report.failures.push(RecordFailure::new(&isbn, Stage::Cover, message));
                    }
                    enriched.push(outcome.record);
                    if (i + 1) % 10 == 0 {
                        debug!("Enriched {}/{} records", i + 1, total);
                    }
                }
                Err(e) => {
                    error!("Enrichment failed for {}: {}", isbn, e);
                    counter!("bookrec_record_errors_total").increment(1);
                    report.failures.push(RecordFailure::new(&isbn, Stage::Enrich, e));
                }
            }
        }

        counter!("bookrec_records_enriched_total").increment(enriched.len() as u64);
        enriched
    }
}
