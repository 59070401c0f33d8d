//! CSV output for extracted records.
//!
//! Each page becomes one file with the header `type,data` and one row per
//! record. Existing files are overwritten without confirmation.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::extract::Record;
use crate::sources::{disambiguated_file_name, output_file_name};
use crate::{PagesiftError, Result};

/// Header row of every output file.
pub const HEADER: [&str; 2] = ["type", "data"];

/// Where and how output files are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the CSV files are written to.
    pub output_dir: PathBuf,
    /// Prefix files with a UTF-8 byte order mark (for spreadsheet apps).
    pub byte_order_mark: bool,
    /// Append a short URL hash to file names so distinct URLs never collide.
    pub disambiguate_names: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { output_dir: PathBuf::from("."), byte_order_mark: false, disambiguate_names: false }
    }
}

impl OutputConfig {
    /// Output path for a source URL.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let name = if self.disambiguate_names { disambiguated_file_name(url) } else { output_file_name(url) };
        self.output_dir.join(name)
    }
}

/// Writes records to a CSV file, replacing any existing file.
///
/// Returns the number of data rows written (the header is not counted).
///
/// # Errors
///
/// Returns [`PagesiftError::Write`] on any filesystem error.
pub fn write_records(path: &Path, records: &[Record], byte_order_mark: bool) -> Result<usize> {
    let write_err = |source| PagesiftError::Write { path: path.to_path_buf(), source };

    let file = File::create(path).map_err(write_err)?;
    let rows = write_records_to(BufWriter::new(file), records, byte_order_mark).map_err(write_err)?;

    tracing::debug!(path = %path.display(), rows, "wrote records");
    Ok(rows)
}

/// Writes the CSV representation of `records` to any writer.
pub fn write_records_to<W: Write>(mut writer: W, records: &[Record], byte_order_mark: bool) -> io::Result<usize> {
    if byte_order_mark {
        writer.write_all("\u{feff}".as_bytes())?;
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;
    for record in records {
        csv.write_record([record.kind.to_string(), record.data.render()])?;
    }
    csv.flush()?;

    Ok(records.len())
}
