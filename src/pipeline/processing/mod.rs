// Per-record processing stages: normalize → enrich → catalog

pub mod catalog;
pub mod enrich;
pub mod normalize;
pub mod text;

pub use enrich::RecordEnricher;
pub use normalize::FieldNormalizer;
