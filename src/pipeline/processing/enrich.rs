use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::normalize::FieldNormalizer;
use super::text::{convert_price, drop_last_char, slugify};
use crate::apis::cover::CoverFetcher;
use crate::error::Result;
use crate::language::Translations;
use crate::types::{Field, Record};

/// A record after local enrichment, plus the non-fatal cover problem if any
#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    pub record: Record,
    pub cover_failure: Option<String>,
}

/// Turns one raw export row into a sheet-ready record: cleaned title, cover,
/// translated binding, local price format and the normalized info fields.
pub struct RecordEnricher {
    translations: Arc<Translations>,
    normalizer: FieldNormalizer,
    covers: CoverFetcher,
}

impl RecordEnricher {
    pub fn new(translations: Arc<Translations>, covers: CoverFetcher) -> Self {
        Self {
            normalizer: FieldNormalizer::new(translations.clone()),
            translations,
            covers,
        }
    }

    /// Fails only on an unknown binding code; cover problems are reported in
    /// the outcome and leave the cover fields empty.
    #[instrument(skip(self, record), fields(isbn = %record.isbn()))]
    pub async fn enrich(&self, mut record: Record) -> Result<EnrichOutcome> {
        let isbn = record.isbn().to_string();
        let info = self.normalizer.normalize(record.value(Field::Information));

        let title = drop_last_char(record.value(Field::Title)).to_string();
        let slug = slugify(&title);

        let (has_cover, cover_failure) = match self.covers.fetch(&isbn, &slug).await {
            Ok(outcome) => (outcome.has_cover(), None),
            Err(e) => {
                warn!("Cover download failed for {}: {}", isbn, e);
                (false, Some(e.to_string()))
            }
        };
        let (cover, cover_dnb) = if has_cover {
            let file_name = self
                .covers
                .cover_path(&isbn, &slug)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            (file_name, self.covers.cover_url(&isbn))
        } else {
            (String::new(), String::new())
        };

        let binding = self.translations.binding(record.value(Field::Binding))?;
        let price = convert_price(record.value(Field::Price));

        record.update([
            (Field::Binding, binding),
            (Field::Price, price),
            (Field::Title, title),
            (Field::Subtitle, String::new()),
            (Field::AgeRating, info.age_label),
            (Field::Year, info.year.unwrap_or_default()),
            (Field::PageCount, info.page_count.map(|n| n.to_string()).unwrap_or_default()),
            (Field::Dimensions, String::new()),
            (Field::Participants, String::new()),
            (Field::Information, info.description),
            (Field::Description, String::new()),
            (Field::Cover, cover),
            (Field::CoverDnb, cover_dnb),
            (Field::CoverKnv, String::new()),
        ]);

        debug!("Enriched '{}'", record.value(Field::Title));
        Ok(EnrichOutcome { record, cover_failure })
    }
}
