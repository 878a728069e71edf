//! Writers for rendered artifacts and long-format result tables.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// One row of a long-format result table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRecord {
    #[serde(rename = "Package")]
    pub package: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Level")]
    pub level: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Creates parent directories for a file path if they don't exist.
pub(crate) fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Creates a buffered writer for the given path.
fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

/// Write a rendered artifact, replacing any existing file.
pub fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent_dirs(path)?;
    let mut writer = create_buffered_writer(path)?;

    let write_err = |e| WriteError::WriteFile {
        path: path.display().to_string(),
        source: e,
    };
    writer.write_all(bytes).map_err(write_err)?;
    writer.flush().map_err(write_err)?;

    Ok(())
}

/// Header row of every long-format table.
pub const LONG_HEADER: [&str; 4] = ["Package", "Date", "Level", "Value"];

/// Streams long-format records into one CSV file.
///
/// The header row is written on creation, so a table without records still
/// has one.
pub struct LongCsvWriter {
    writer: csv::Writer<BufWriter<File>>,
    path: String,
    rows: usize,
}

impl LongCsvWriter {
    pub fn create(path: &Path) -> Result<Self> {
        ensure_parent_dirs(path)?;
        let inner = create_buffered_writer(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer
            .write_record(LONG_HEADER)
            .map_err(|source| WriteError::CsvError {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self {
            writer,
            path: path.display().to_string(),
            rows: 0,
        })
    }

    pub fn write(&mut self, record: &LongRecord) -> Result<()> {
        self.writer
            .serialize(record)
            .map_err(|source| WriteError::CsvError {
                path: self.path.clone(),
                source,
            })?;
        self.rows += 1;
        Ok(())
    }

    /// Number of data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush buffered rows to disk and return the row count.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush().map_err(|e| WriteError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(self.rows)
    }
}
