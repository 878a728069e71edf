//! Loaders for long-format language level result CSVs.
//!
//! A result file has one row per (package release, language level) with the
//! columns `Package`, `Date`, `Level` and `Value`. Column order is free and
//! extra columns are ignored.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use thiserror::Error;

/// Columns every result CSV must provide.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Date", "Level", "Value", "Package"];

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parsing error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("missing required columns in '{path}': {columns}")]
    MissingColumns { path: PathBuf, columns: String },

    #[error("parse error in '{path}' row {row}: {message}")]
    ParseError {
        path: PathBuf,
        row: usize,
        message: String,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// One row of a result CSV as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub package: String,
    pub date: NaiveDateTime,
    /// Raw level label, resolved against the vocabulary during derivation
    pub level: String,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Package")]
    package: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Level")]
    level: String,
    #[serde(rename = "Value")]
    value: f64,
}

/// A result row with its derived plot coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub package: String,
    pub date: NaiveDateTime,
    pub level: String,
    pub value: f64,
    /// Position of `level` in the vocabulary
    pub level_format: usize,
    /// Fractional days since 1970-01-01
    pub date_format: f64,
}

/// A named, ordered collection of derived result rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub rows: Vec<ResultRow>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, rows: Vec<ResultRow>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }

    /// A new dataset holding the rows that satisfy `keep`.
    pub fn filter<F>(&self, name: impl Into<String>, keep: F) -> Dataset
    where
        F: Fn(&ResultRow) -> bool,
    {
        Dataset {
            name: name.into(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Plot coordinates `[LevelFormat, DateFormat, Value]` per row.
    pub fn points(&self) -> Vec<[f64; 3]> {
        self.rows
            .iter()
            .map(|r| [r.level_format as f64, r.date_format, r.value])
            .collect()
    }
}

/// Parse a calendar date or date-time in the formats the result tables use.
///
/// Plain dates resolve to midnight.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }

    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Load result records from a CSV file.
///
/// # Errors
///
/// Fails if the file cannot be opened, a required column is absent, or a
/// row has an unparseable `Date` or `Value`.
pub fn load_results_csv<P: AsRef<Path>>(path: P) -> Result<Vec<ResultRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(BufReader::new(file));

    let csv_err = |source| LoaderError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let headers = reader.headers().map_err(csv_err)?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(LoaderError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing.join(", "),
        });
    }

    let mut records = Vec::new();
    for (i, raw) in reader.deserialize::<RawRecord>().enumerate() {
        let row = i + 1;
        let raw = raw.map_err(|e| LoaderError::ParseError {
            path: path.to_path_buf(),
            row,
            message: e.to_string(),
        })?;

        let date = parse_date(&raw.date).ok_or_else(|| LoaderError::ParseError {
            path: path.to_path_buf(),
            row,
            message: format!("invalid date '{}'", raw.date),
        })?;

        records.push(ResultRecord {
            package: raw.package,
            date,
            level: raw.level,
            value: raw.value,
        });
    }

    log::debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_results_csv() -> Result<()> {
        let file = csv_file(&[
            "Package,Date,Level,Value",
            "A,2020-01-01,7.0,1.0",
            "B,2021-01-01,8.2,2.5",
        ]);

        let records = load_results_csv(file.path())?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].package, "A");
        assert_eq!(records[0].level, "7.0");
        assert_eq!(records[1].value, 2.5);
        assert_eq!(
            records[1].date,
            NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );

        Ok(())
    }

    #[test]
    fn test_column_order_and_extra_columns() -> Result<()> {
        let file = csv_file(&["Value,Extra,Level,Package,Date", "3.5,x,5.2,pkg,2012-03-04"]);

        let records = load_results_csv(file.path())?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].package, "pkg");
        assert_eq!(records[0].value, 3.5);

        Ok(())
    }

    #[test]
    fn test_missing_columns() {
        let file = csv_file(&["Package,Date,Value", "A,2020-01-01,1.0"]);

        match load_results_csv(file.path()) {
            Err(LoaderError::MissingColumns { columns, .. }) => assert_eq!(columns, "Level"),
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_results_csv(dir.path().join("absent.csv"));
        assert!(matches!(result, Err(LoaderError::Io { .. })));
    }

    #[test]
    fn test_bad_date_and_value_report_row() {
        let file = csv_file(&["Package,Date,Level,Value", "A,2020-01-01,7.0,1.0", "A,soon,7.0,1.0"]);
        match load_results_csv(file.path()) {
            Err(LoaderError::ParseError { row, .. }) => assert_eq!(row, 2),
            other => panic!("expected ParseError, got {:?}", other),
        }

        let file = csv_file(&["Package,Date,Level,Value", "A,2020-01-01,7.0,lots"]);
        assert!(matches!(
            load_results_csv(file.path()),
            Err(LoaderError::ParseError { row: 1, .. })
        ));
    }

    #[test]
    fn test_parse_date_formats() {
        let midnight = NaiveDate::from_ymd_opt(2015, 6, 30)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date("2015-06-30"), Some(midnight));
        assert_eq!(parse_date(" 2015/06/30 "), Some(midnight));
        assert_eq!(parse_date("30.06.2015"), Some(midnight));
        assert_eq!(
            parse_date("2015-06-30 12:00:00"),
            midnight.checked_add_signed(chrono::Duration::hours(12))
        );
        assert_eq!(
            parse_date("2015-06-30T00:00:00+02:00"),
            midnight.checked_sub_signed(chrono::Duration::hours(2))
        );
        assert_eq!(parse_date("June 2015"), None);
    }

    #[test]
    fn test_dataset_filter_and_points() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let row = |package: &str, level_format: usize| ResultRow {
            package: package.to_string(),
            date,
            level: String::new(),
            value: 1.0,
            level_format,
            date_format: 18262.0,
        };
        let dataset = Dataset::new("all", vec![row("A", 1), row("B", 2), row("A", 3)]);

        let only_a = dataset.filter("A", |r| r.package == "A");
        assert_eq!(only_a.name, "A");
        assert_eq!(only_a.len(), 2);
        assert_eq!(only_a.points()[1], [3.0, 18262.0, 1.0]);
        assert!(dataset.filter("none", |_| false).is_empty());
    }
}
