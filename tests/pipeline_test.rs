use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

use bookrec::apis::cover::CoverFetcher;
use bookrec::apis::knv::KnvProvider;
use bookrec::app::ports::{HttpClientPort, HttpResponse};
use bookrec::config::{CatalogConfig, Credentials};
use bookrec::error::EnrichError;
use bookrec::language::Translations;
use bookrec::pipeline::csv_bridge::CsvBridge;
use bookrec::pipeline::processing::catalog::{CatalogProvider, ProviderOutput, ProviderRegistry};
use bookrec::pipeline::processing::RecordEnricher;
use bookrec::pipeline::Pipeline;
use bookrec::types::{Field, Record, Stage};

const COVER_ENDPOINT: &str = "https://portal.dnb.de/opac/mvb/cover.htm";

/// Replays canned responses in order
#[derive(Default)]
struct ScriptedHttp {
    responses: Mutex<VecDeque<HttpResponse>>,
    bodies: Mutex<Vec<String>>,
}

impl ScriptedHttp {
    fn with(bodies: &[&str]) -> Self {
        let http = Self::default();
        for body in bodies {
            http.responses.lock().unwrap().push_back(HttpResponse {
                status: 200,
                bytes: body.as_bytes().to_vec(),
            });
        }
        http
    }

    fn next(&self) -> Result<HttpResponse, String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| "no response scripted".to_string())
    }
}

#[async_trait]
impl HttpClientPort for ScriptedHttp {
    async fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Result<HttpResponse, String> {
        self.bodies.lock().unwrap().push(url.to_string());
        self.next()
    }

    async fn post(&self, _url: &str, _content_type: &str, body: String) -> Result<HttpResponse, String> {
        self.bodies.lock().unwrap().push(body);
        self.next()
    }
}

/// Catalog that tags every record with its own name, or fails outright
struct TaggingProvider {
    name: &'static str,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl CatalogProvider for TaggingProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn process(&self, records: &[Record]) -> bookrec::error::Result<ProviderOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EnrichError::Api {
                message: "catalog offline".to_string(),
            });
        }
        let records = records
            .iter()
            .cloned()
            .map(|mut record| {
                record.set(Field::Subtitle, self.name);
                record
            })
            .collect();
        Ok(ProviderOutput {
            records,
            failures: Vec::new(),
        })
    }
}

fn translations() -> Arc<Translations> {
    Arc::new(
        Translations::from_json(
            r#"{"binding": {"Gb.": "gebunden", "kart.": "kartoniert"}, "information": {"Illustr.": "Illustrationen"}}"#,
        )
        .unwrap(),
    )
}

fn write_export(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("Titelexport.csv");
    fs::write(
        &path,
        "Ende, Michael;Momo.;Thienemann;9783522202107;Gb.;16.00 EUR;;;;\"Mit Illustr.; ab 12 J.; 304 S.; 2018\";;Klassiker\n\
         Preußler, Otfried;Krabat.;Thienemann;9783522202060;Leder;18.00 EUR;;;;2019;;\n\
         kaputt;zeile\n\
         Funke, Cornelia;Tintenherz.;Dressler;9783791504650;kart.;12.00 EUR;;;;ab 10 J.;;\n",
    )
    .unwrap();
    path
}

fn pipeline(images: &Path, providers: ProviderRegistry) -> Pipeline {
    // Downloads off: no cover requests, no cover failures
    let covers = CoverFetcher::new(Arc::new(ScriptedHttp::default()), COVER_ENDPOINT, images).with_downloads(false);
    Pipeline::new(
        CsvBridge::default(),
        CsvBridge::default(),
        RecordEnricher::new(translations(), covers),
        providers,
    )
}

fn search_response(article: &str) -> String {
    let escaped = article.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
    format!("<soap:Envelope><soap:Body><WSCallResponse><ArtikelDaten>{escaped}</ArtikelDaten></WSCallResponse></soap:Body></soap:Envelope>")
}

#[tokio::test]
async fn test_run_with_knv_catalog() -> Result<()> {
    let dir = tempdir()?;
    let input = write_export(dir.path());
    let output = dir.path().join("dist/data.csv");

    let login = "<soap:Envelope><soap:Body><WSCallResponse><SessionID>s-42</SessionID></WSCallResponse></soap:Body></soap:Envelope>";
    let momo = search_response(
        "<Artikel><Utitel>Roman</Utitel><Breite>135</Breite><Hoehe>210</Hoehe><Mitarb>Ende, Michael</Mitarb></Artikel>",
    );
    let tintenherz = search_response("<Artikel><Erschjahr>2003</Erschjahr></Artikel>");
    let http = Arc::new(ScriptedHttp::with(&[login, momo.as_str(), tintenherz.as_str(), "<ok/>"]));
    let knv = KnvProvider::new(
        http.clone(),
        &CatalogConfig::default(),
        Some(Credentials {
            user: "4711".to_string(),
            password: "geheim".to_string(),
        }),
    );

    let report = pipeline(dir.path(), ProviderRegistry::new().with(Box::new(knv)))
        .run(&input, &output)
        .await?;

    assert_eq!(report.total_records, 4);
    assert_eq!(report.enriched_records, 2);
    assert_eq!(report.written_records, 2);
    assert_eq!(report.provider.as_deref(), Some("knv"));

    let stages: Vec<Stage> = report.failures.iter().map(|f| f.stage).collect();
    assert_eq!(stages, vec![Stage::Read, Stage::Enrich]);
    assert_eq!(report.failures[1].isbn, "9783522202060");

    let written = CsvBridge::default().with_header_row(true).read(&output)?;
    assert!(written.malformed.is_empty());
    let momo = &written.records[0];
    assert_eq!(momo.value(Field::Title), "Momo");
    assert_eq!(momo.value(Field::Subtitle), "Roman");
    assert_eq!(momo.value(Field::Binding), "gebunden");
    assert_eq!(momo.value(Field::Price), "16,00 €");
    assert_eq!(momo.value(Field::AgeRating), "ab 12 Jahren");
    assert_eq!(momo.value(Field::PageCount), "304");
    assert_eq!(momo.value(Field::Year), "2018");
    assert_eq!(momo.value(Field::Dimensions), "13,5cm x 21,0cm");
    assert_eq!(momo.value(Field::Description), "Keine Beschreibung vorhanden!");

    let tintenherz = &written.records[1];
    assert_eq!(tintenherz.value(Field::Year), "2003");
    assert_eq!(tintenherz.value(Field::Subtitle), "");
    assert_eq!(tintenherz.value(Field::Participants), "");

    let header = fs::read_to_string(&output)?;
    let labels: Vec<&str> = header.lines().next().unwrap_or_default().split(';').collect();
    let expected: Vec<&str> = Field::ALL.iter().map(|f| f.label()).collect();
    assert_eq!(labels, expected);

    let requests = http.bodies.lock().unwrap().clone();
    assert_eq!(requests.len(), 4);
    assert!(requests[3].contains("<Logout>true</Logout>"));
    Ok(())
}

#[tokio::test]
async fn test_first_delivering_provider_wins() -> Result<()> {
    let dir = tempdir()?;
    let input = write_export(dir.path());
    let output = dir.path().join("data.csv");
    let calls = Arc::new(AtomicUsize::new(0));

    let providers = ProviderRegistry::new()
        .with(Box::new(TaggingProvider {
            name: "offline",
            fail: true,
            calls: calls.clone(),
        }))
        .with(Box::new(TaggingProvider {
            name: "backup",
            fail: false,
            calls: calls.clone(),
        }))
        .with(Box::new(TaggingProvider {
            name: "never",
            fail: false,
            calls: calls.clone(),
        }));

    let report = pipeline(dir.path(), providers).run(&input, &output).await?;

    assert_eq!(report.provider.as_deref(), Some("backup"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let written = CsvBridge::default().with_header_row(true).read(&output)?;
    assert!(written.records.iter().all(|r| r.value(Field::Subtitle) == "backup"));
    Ok(())
}

#[tokio::test]
async fn test_locally_enriched_records_written_when_no_provider_delivers() -> Result<()> {
    let dir = tempdir()?;
    let input = write_export(dir.path());
    let output = dir.path().join("data.csv");

    let providers = ProviderRegistry::new().with(Box::new(TaggingProvider {
        name: "offline",
        fail: true,
        calls: Arc::new(AtomicUsize::new(0)),
    }));
    let report = pipeline(dir.path(), providers).run(&input, &output).await?;

    assert_eq!(report.provider, None);
    assert_eq!(report.written_records, 2);
    let written = CsvBridge::default().with_header_row(true).read(&output)?;
    assert_eq!(written.records[1].value(Field::Title), "Tintenherz");
    assert_eq!(written.records[1].value(Field::Binding), "kartoniert");
    Ok(())
}

#[tokio::test]
async fn test_missing_input_writes_nothing() -> Result<()> {
    let dir = tempdir()?;
    let output = dir.path().join("data.csv");

    let report = pipeline(dir.path(), ProviderRegistry::new())
        .run(&dir.path().join("missing.csv"), &output)
        .await?;

    assert_eq!(report.total_records, 0);
    assert!(report.failures.is_empty());
    assert!(!output.exists());
    Ok(())
}
