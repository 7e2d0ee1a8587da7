//! Catalog providers: a second enrichment pass keyed by ISBN.

pub mod registry;

pub use registry::ProviderRegistry;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Field, Record, RecordFailure};

/// Records returned by a provider, plus the lookups that failed along the way
#[derive(Debug, Default)]
pub struct ProviderOutput {
    pub records: Vec<Record>,
    pub failures: Vec<RecordFailure>,
}

/// An external catalog that can fill in what the export lacks.
///
/// An `Err`, or `Ok` with no records, means the provider could not serve this
/// run and the next registered one is tried.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process(&self, records: &[Record]) -> Result<ProviderOutput>;
}

/// What a catalog lookup contributes to one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogEnrichment {
    pub year: String,
    pub author: String,
    pub subtitle: String,
    pub dimensions: String,
    pub participants: String,
    pub description: String,
    pub cover_url: String,
}

impl CatalogEnrichment {
    pub fn into_fields(self) -> [(Field, String); 7] {
        [
            (Field::Year, self.year),
            (Field::Author, self.author),
            (Field::Subtitle, self.subtitle),
            (Field::Dimensions, self.dimensions),
            (Field::Participants, self.participants),
            (Field::Description, self.description),
            (Field::CoverKnv, self.cover_url),
        ]
    }

    /// Merges the non-empty values and puts the record into output order
    pub fn apply_to(self, record: &mut Record) {
        record.merge_non_empty(self.into_fields());
        record.sort_canonical();
    }
}
