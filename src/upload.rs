//! Reads an order upload (CSV with a header row) into raw rows.

use iso_gateway::RawRow;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read upload: {0}")]
    Csv(#[from] csv::Error),
}

/// Header row plus data rows keyed by that header, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Upload {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl Upload {
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let file = std::fs::File::open(path).map_err(|source| UploadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let upload = Self::from_reader(file)?;
        debug!(
            "Read {} rows with {} columns from {}",
            upload.rows.len(),
            upload.columns.len(),
            path.display()
        );
        Ok(upload)
    }

    /// Short rows keep only the cells they have; a missing cell is reported
    /// when the row is serialized.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, UploadError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|column| column.trim_start_matches(BYTE_ORDER_MARK).trim().to_string())
            .collect();
        if columns.iter().all(String::is_empty) {
            return Ok(Self::default());
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            rows.push(
                columns
                    .iter()
                    .zip(record.iter())
                    .map(|(column, value)| (column.clone(), value.to_string()))
                    .collect(),
            );
        }

        Ok(Self { columns, rows })
    }
}
