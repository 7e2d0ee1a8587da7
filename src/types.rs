use serde::{Deserialize, Serialize};
use std::fmt;

/// The columns a book record can carry.
///
/// Declaration order is the canonical output order; `Ord` is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Author,
    Title,
    Subtitle,
    Publisher,
    Participants,
    Isbn,
    Binding,
    Price,
    Year,
    AgeRating,
    PageCount,
    Dimensions,
    Information,
    Addendum,
    Comment,
    Description,
    Cover,
    CoverDnb,
    CoverKnv,
    OpaqueA,
    OpaqueB,
    OpaqueC,
}

impl Field {
    /// Column order of a pcbis.de title export (no header row in the file)
    pub const INPUT_SCHEMA: [Field; 12] = [
        Field::Author,
        Field::Title,
        Field::Publisher,
        Field::Isbn,
        Field::Binding,
        Field::Price,
        Field::OpaqueA,
        Field::OpaqueB,
        Field::OpaqueC,
        Field::Information,
        Field::Addendum,
        Field::Comment,
    ];

    pub const ALL: [Field; 22] = [
        Field::Author,
        Field::Title,
        Field::Subtitle,
        Field::Publisher,
        Field::Participants,
        Field::Isbn,
        Field::Binding,
        Field::Price,
        Field::Year,
        Field::AgeRating,
        Field::PageCount,
        Field::Dimensions,
        Field::Information,
        Field::Addendum,
        Field::Comment,
        Field::Description,
        Field::Cover,
        Field::CoverDnb,
        Field::CoverKnv,
        Field::OpaqueA,
        Field::OpaqueB,
        Field::OpaqueC,
    ];

    /// Column label as used in CSV headers and by the sheet templates
    pub fn label(self) -> &'static str {
        match self {
            Field::Author => "AutorIn",
            Field::Title => "Titel",
            Field::Subtitle => "Untertitel",
            Field::Publisher => "Verlag",
            Field::Participants => "Mitwirkende",
            Field::Isbn => "ISBN",
            Field::Binding => "Einband",
            Field::Price => "Preis",
            Field::Year => "Erscheinungsjahr",
            Field::AgeRating => "Altersempfehlung",
            Field::PageCount => "Seitenzahl",
            Field::Dimensions => "Abmessungen",
            Field::Information => "Informationen",
            Field::Addendum => "Zusatz",
            Field::Comment => "Kommentar",
            Field::Description => "Inhaltsbeschreibung",
            Field::Cover => "Cover",
            Field::CoverDnb => "Cover DNB",
            Field::CoverKnv => "Cover KNV",
            Field::OpaqueA => "a",
            Field::OpaqueB => "b",
            Field::OpaqueC => "c",
        }
    }

    pub fn from_label(label: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.label() == label)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One book flowing through the pipeline.
///
/// Keys keep insertion order until [`Record::sort_canonical`] is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(Field, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == field)
            .map(|(_, value)| value.as_str())
    }

    /// Like `get`, but absent fields read as empty
    pub fn value(&self, field: Field) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn isbn(&self) -> &str {
        self.value(Field::Isbn)
    }

    /// Overwrites the field in place, or appends it when new
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| *key == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn update<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (Field, String)>,
    {
        for (field, value) in values {
            self.set(field, value);
        }
    }

    /// Merges only non-empty values; existing content is never blanked
    pub fn merge_non_empty<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (Field, String)>,
    {
        self.update(values.into_iter().filter(|(_, value)| !value.is_empty()));
    }

    pub fn sort_canonical(&mut self) {
        self.fields.sort_by_key(|(field, _)| *field);
    }

    pub fn keys(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.iter().map(|(field, _)| *field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields.iter().map(|(field, value)| (*field, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(Field, String)> for Record {
    fn from_iter<T: IntoIterator<Item = (Field, String)>>(iter: T) -> Self {
        let mut record = Record::new();
        record.update(iter);
        record
    }
}

/// Facts pulled out of the free-text "Informationen" column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInfo {
    pub description: String,
    pub year: Option<String>,
    pub age_label: String,
    pub page_count: Option<u32>,
}

/// Where in the run a record failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Read,
    Enrich,
    Cover,
    Catalog,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "read",
            Stage::Enrich => "enrich",
            Stage::Cover => "cover",
            Stage::Catalog => "catalog",
        };
        f.write_str(name)
    }
}

/// A per-record problem collected into the run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub isbn: String,
    pub stage: Stage,
    pub message: String,
}

impl RecordFailure {
    pub fn new(isbn: impl Into<String>, stage: Stage, message: impl fmt::Display) -> Self {
        Self {
            isbn: isbn.into(),
            stage,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.isbn.is_empty() {
            write!(f, "[{}] {}", self.stage, self.message)
        } else {
            write!(f, "[{}] {}: {}", self.stage, self.isbn, self.message)
        }
    }
}
