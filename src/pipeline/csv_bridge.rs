use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use encoding_rs::WINDOWS_1252;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use crate::constants::DEFAULT_DELIMITER;
use crate::error::{EnrichError, Result};
use crate::types::{Field, Record};

/// Records read from a file, plus the rows that could not be aligned
#[derive(Debug, Default)]
pub struct ReadOutcome {
    pub records: Vec<Record>,
    pub malformed: Vec<EnrichError>,
}

/// Reads and writes delimited files of book records
pub struct CsvBridge {
    schema: Vec<Field>,
    delimiter: u8,
    header_row: bool,
}

impl Default for CsvBridge {
    fn default() -> Self {
        Self::new(Field::INPUT_SCHEMA.to_vec(), DEFAULT_DELIMITER as u8)
    }
}

impl CsvBridge {
    /// `schema` names the columns of a header-less file, in order
    pub fn new(schema: Vec<Field>, delimiter: u8) -> Self {
        Self {
            schema,
            delimiter,
            header_row: false,
        }
    }

    /// Take the schema from the file's first row instead (unknown labels are dropped)
    pub fn with_header_row(mut self, header_row: bool) -> Self {
        self.header_row = header_row;
        self
    }

    pub fn read(&self, path: &Path) -> Result<ReadOutcome> {
        let file = File::open(path).map_err(|e| {
            warn!("Cannot open {}: {}", path.display(), e);
            EnrichError::InputUnavailable(path.to_path_buf())
        })?;
        self.read_from(file)
    }

    pub fn read_from<R: io::Read>(&self, reader: R) -> Result<ReadOutcome> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut schema: Vec<Option<Field>> = self.schema.iter().copied().map(Some).collect();
        let mut outcome = ReadOutcome::default();
        let mut row = ByteRecord::new();
        let mut line = 0;

        while reader.read_byte_record(&mut row)? {
            line += 1;
            if self.header_row && line == 1 {
                schema = row.iter().map(|label| Field::from_label(&decode_field(label))).collect();
                continue;
            }

            if row.len() < schema.len() {
                outcome.malformed.push(EnrichError::MalformedRow {
                    row: line,
                    expected: schema.len(),
                    found: row.len(),
                });
                continue;
            }

            // Extra trailing columns are ignored
            let record: Record = schema
                .iter()
                .copied()
                .zip(row.iter())
                .filter_map(|(field, value)| field.map(|f| (f, decode_field(value))))
                .collect();
            outcome.records.push(record);
        }

        debug!(
            "Read {} records ({} malformed rows)",
            outcome.records.len(),
            outcome.malformed.len()
        );
        Ok(outcome)
    }

    pub fn write(&self, records: &[Record], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.write_to(records, File::create(path)?)
    }

    /// The header comes from the first record's keys; all records are expected
    /// to share them.
    pub fn write_to<W: io::Write>(&self, records: &[Record], writer: W) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_writer(writer);

        if let Some(first) = records.first() {
            writer.write_record(first.keys().map(Field::label))?;
        }
        for record in records {
            writer.write_record(record.iter().map(|(_, value)| value))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// UTF-8 as is; anything else is taken to be the export's Windows-1252
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
    }
}
