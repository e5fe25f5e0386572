use crate::error::Result;
use crate::models::NoiseComplaint;
use crate::utils::constants::REQUIRED_COLUMNS;
use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;

/// Writes the cleaned table consumed by the analyzer
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Write records to `path`, creating parent directories. An empty slice
    /// still produces a header row so the analyzer can load the file.
    pub fn write_records(&self, records: &[NoiseComplaint], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = std::fs::File::create(path)?;
        self.write_to(records, std::io::BufWriter::new(file))
    }

    pub fn write_to<W: Write>(&self, records: &[NoiseComplaint], sink: W) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(sink);

        writer.write_record(REQUIRED_COLUMNS)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
