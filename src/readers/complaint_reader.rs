use crate::error::{ProcessingError, Result};
use crate::models::{NoiseComplaint, RawComplaint};
use crate::utils::constants::{NULL_TOKENS, REQUIRED_COLUMNS};
use crate::utils::progress::ProgressReporter;
use csv::{ByteRecord, ReaderBuilder};
use std::borrow::Cow;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Positions of the required columns within a file's header row
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    created_date: usize,
    complaint_type: usize,
    descriptor: usize,
    borough: usize,
    latitude: usize,
    longitude: usize,
}

impl ColumnIndex {
    fn resolve(headers: &ByteRecord, path: &Path) -> Result<Self> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| decode_field(h).trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut positions = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = names.iter().position(|n| n == column).ok_or_else(|| {
                ProcessingError::MissingColumn {
                    column: column.to_string(),
                    path: path.to_path_buf(),
                }
            })?;
        }

        Ok(Self {
            created_date: positions[0],
            complaint_type: positions[1],
            descriptor: positions[2],
            borough: positions[3],
            latitude: positions[4],
            longitude: positions[5],
        })
    }
}

/// Reads complaint tables, keeping only the six required columns
#[derive(Debug, Clone, Copy)]
pub struct ComplaintReader {
    delimiter: u8,
}

impl ComplaintReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Read a raw export; fails if any required column is absent
    pub fn read_raw(
        &self,
        path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<RawComplaint>> {
        let file = std::fs::File::open(path)?;
        self.read_raw_from(file, path, progress)
    }

    /// Read a cleaned table, dropping any row that lacks a required field.
    /// Returns the rows together with the number dropped.
    pub fn read_cleaned(&self, path: &Path) -> Result<(Vec<NoiseComplaint>, usize)> {
        let raw = self.read_raw(path, None)?;
        let total = raw.len();

        let records: Vec<NoiseComplaint> = raw
            .into_iter()
            .filter_map(|r| NoiseComplaint::try_from(r).ok())
            .collect();

        let dropped = total - records.len();
        if dropped > 0 {
            warn!(
                dropped,
                path = %path.display(),
                "cleaned table contained rows with missing required fields"
            );
        }

        Ok((records, dropped))
    }

    fn read_raw_from<R: Read>(
        &self,
        source: R,
        path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<RawComplaint>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let headers = reader.byte_headers()?.clone();
        let columns = ColumnIndex::resolve(&headers, path)?;
        debug!(?columns, "resolved required columns");

        let mut records = Vec::new();
        let mut record = ByteRecord::new();
        while reader.read_byte_record(&mut record)? {
            records.push(RawComplaint {
                created_date: text_field(&record, columns.created_date),
                complaint_type: text_field(&record, columns.complaint_type),
                descriptor: text_field(&record, columns.descriptor),
                borough: text_field(&record, columns.borough),
                latitude: float_field(&record, columns.latitude),
                longitude: float_field(&record, columns.longitude),
            });

            if records.len() % 100_000 == 0 {
                if let Some(p) = progress {
                    p.set_message(&format!("Loaded {} rows...", records.len()));
                }
            }
        }

        Ok(records)
    }
}

impl Default for ComplaintReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a cell as UTF-8, falling back to Windows-1252 for legacy exports
fn decode_field(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes).0,
    }
}

fn is_null(value: &str) -> bool {
    value.is_empty() || NULL_TOKENS.contains(&value)
}

fn text_field(record: &ByteRecord, index: usize) -> Option<String> {
    let value = decode_field(record.get(index)?);
    if is_null(&value) {
        None
    } else {
        Some(value.into_owned())
    }
}

fn float_field(record: &ByteRecord, index: usize) -> Option<f64> {
    let value = decode_field(record.get(index)?);
    let value = value.trim();
    if is_null(value) {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}
