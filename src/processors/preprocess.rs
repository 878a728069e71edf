//! Wide-to-long conversion of language level result tables.
//!
//! The analysis writes one row per package release with one column per
//! language level (`Package, Version, Date, 5.2, 5.3, ...`). The report reads
//! one row per (release, level) instead (`Package, Date, Level, Value`).

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use log::{debug, info};
use thiserror::Error;

use crate::config::PreprocessConfig;
use crate::core::levels::LevelVocabulary;
use crate::core::writers::{LongCsvWriter, LongRecord};

/// Errors that can occur while reading a wide result table.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("missing column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("no language level columns in {path}")]
    NoLevelColumns { path: PathBuf },
}

/// Column positions of a wide result table.
#[derive(Debug, Clone, PartialEq)]
pub struct WideLayout {
    pub package: usize,
    pub date: usize,
    /// (column index, vocabulary label) in column order
    pub levels: Vec<(usize, String)>,
}

impl WideLayout {
    /// Locate the package, date and level columns in a header row.
    ///
    /// Level columns are matched against the vocabulary; other headers
    /// (`Version`, levels outside the vocabulary) are skipped.
    pub fn from_headers(
        headers: &csv::StringRecord,
        vocab: &LevelVocabulary,
        path: &Path,
    ) -> std::result::Result<Self, PreprocessError> {
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| PreprocessError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })
        };
        let package = find("Package")?;
        let date = find("Date")?;

        let mut levels = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            if i == package || i == date || header.trim() == "Version" {
                continue;
            }
            match vocab.index_of(header) {
                Ok(idx) => {
                    if let Some(label) = vocab.label(idx) {
                        levels.push((i, label.to_string()));
                    }
                }
                Err(_) => debug!("Skipping column '{}' in {}", header, path.display()),
            }
        }

        if levels.is_empty() {
            return Err(PreprocessError::NoLevelColumns {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            package,
            date,
            levels,
        })
    }
}

/// Read a wide table and hand every long record to `emit`, row by row and
/// level column by level column. Returns the number of records emitted.
pub fn melt_wide_csv<F>(path: &Path, vocab: &LevelVocabulary, mut emit: F) -> Result<usize>
where
    F: FnMut(LongRecord) -> Result<()>,
{
    let file = File::open(path)
        .with_context(|| format!("Failed to open wide table: {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(BufReader::new(file));

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    let layout = WideLayout::from_headers(&headers, vocab, path)?;

    let mut emitted = 0;
    for (row, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to read row {} of {}", row + 1, path.display()))?;
        let package = record.get(layout.package).unwrap_or_default();
        let date = record.get(layout.date).unwrap_or_default();

        for (col, label) in &layout.levels {
            emit(LongRecord {
                package: package.to_string(),
                date: date.to_string(),
                level: label.clone(),
                value: record.get(*col).unwrap_or_default().to_string(),
            })?;
            emitted += 1;
        }
    }

    Ok(emitted)
}

/// Row counts written by a preprocess run.
#[derive(Debug, Default, PartialEq)]
pub struct PreprocessSummary {
    /// Per-input long tables and their row counts
    pub outputs: Vec<(PathBuf, usize)>,
    /// Combined table and its row count
    pub combined: (PathBuf, usize),
}

/// Convert every configured wide table to its long table and append all
/// rows, in input order, to the combined table.
pub fn run_preprocess(
    config: &PreprocessConfig,
    vocab: &LevelVocabulary,
) -> Result<PreprocessSummary> {
    let mut combined = LongCsvWriter::create(&config.combined)?;
    let mut outputs = Vec::with_capacity(config.inputs.len());

    for input in &config.inputs {
        info!("Preprocessing {} -> {}", input.wide.display(), input.long.display());

        let mut long = LongCsvWriter::create(&input.long)?;
        melt_wide_csv(&input.wide, vocab, |record| {
            long.write(&record)?;
            combined.write(&record)?;
            Ok(())
        })?;

        let rows = long.finish()?;
        info!("Wrote {} rows to {}", rows, input.long.display());
        outputs.push((input.long.clone(), rows));
    }

    let combined_rows = combined.finish()?;
    info!("Wrote {} rows to {}", combined_rows, config.combined.display());

    Ok(PreprocessSummary {
        outputs,
        combined: (config.combined.clone(), combined_rows),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreprocessInput;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(path: &Path, lines: &[&str]) {
        fs::write(path, lines.join("\n") + "\n").unwrap();
    }

    #[test]
    fn test_layout_skips_unknown_levels() {
        let vocab = LevelVocabulary::standard();
        let headers = csv::StringRecord::from(vec![
            "Package", "Version", "Date", "7.3", "7.4", "8.0",
        ]);

        let layout = WideLayout::from_headers(&headers, &vocab, Path::new("wide.csv")).unwrap();
        assert_eq!(layout.package, 0);
        assert_eq!(layout.date, 2);
        assert_eq!(
            layout.levels,
            vec![(3, "7.3".to_string()), (5, "8.0".to_string())]
        );
    }

    #[test]
    fn test_layout_requires_columns() {
        let vocab = LevelVocabulary::standard();

        let headers = csv::StringRecord::from(vec!["Package", "Version", "5.2"]);
        assert!(matches!(
            WideLayout::from_headers(&headers, &vocab, Path::new("x.csv")),
            Err(PreprocessError::MissingColumn { column: "Date", .. })
        ));

        let headers = csv::StringRecord::from(vec!["Package", "Version", "Date"]);
        assert!(matches!(
            WideLayout::from_headers(&headers, &vocab, Path::new("x.csv")),
            Err(PreprocessError::NoLevelColumns { .. })
        ));
    }

    #[test]
    fn test_melt_wide_csv() {
        let temp_dir = TempDir::new().unwrap();
        let wide = temp_dir.path().join("test.csv");
        write_file(
            &wide,
            &[
                "Package,Version,Date,5.2,5.3",
                "acme/http,1.0.0,2012-05-01,0.9,0.1",
                "acme/http,2.0.0,2016-05-01,0.4,0.6",
            ],
        );

        let mut records = Vec::new();
        let count = melt_wide_csv(&wide, &LevelVocabulary::standard(), |r| {
            records.push(r);
            Ok(())
        })
        .unwrap();

        assert_eq!(count, 4);
        let levels: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.level.as_str(), r.value.as_str()))
            .collect();
        assert_eq!(levels, vec![("5.2", "0.9"), ("5.3", "0.1"), ("5.2", "0.4"), ("5.3", "0.6")]);
        assert_eq!(records[2].date, "2016-05-01");
        assert_eq!(records[2].package, "acme/http");
    }

    #[test]
    fn test_run_preprocess_writes_long_and_combined_tables() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write_file(
            &base.join("test.csv"),
            &["Package,Version,Date,5.2,8.2", "a,1.0,2012-01-01,1,0"],
        );
        write_file(
            &base.join("train.csv"),
            &[
                "Package,Version,Date,5.2,8.2",
                "b,1.0,2020-01-01,0,1",
                "b,1.1,2021-01-01,0,1",
            ],
        );

        let config = PreprocessConfig {
            inputs: vec![
                PreprocessInput {
                    wide: base.join("test.csv"),
                    long: base.join("out").join("pandas_test.csv"),
                },
                PreprocessInput {
                    wide: base.join("train.csv"),
                    long: base.join("out").join("pandas_train.csv"),
                },
            ],
            combined: base.join("out").join("pandas.csv"),
        };

        let summary = run_preprocess(&config, &LevelVocabulary::standard()).unwrap();
        assert_eq!(summary.outputs[0].1, 2);
        assert_eq!(summary.outputs[1].1, 4);
        assert_eq!(summary.combined.1, 6);

        let combined = fs::read_to_string(base.join("out").join("pandas.csv")).unwrap();
        let lines: Vec<&str> = combined.lines().collect();
        assert_eq!(lines[0], "Package,Date,Level,Value");
        assert_eq!(lines[1], "a,2012-01-01,5.2,1");
        assert_eq!(lines[3], "b,2020-01-01,5.2,0");
        assert_eq!(lines.len(), 7);

        // The long tables load straight into the report pipeline.
        let records =
            crate::core::loaders::load_results_csv(base.join("out").join("pandas_train.csv"))
                .unwrap();
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_run_preprocess_header_only_input() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write_file(&base.join("test.csv"), &["Package,Version,Date,5.2,8.2"]);

        let config = PreprocessConfig {
            inputs: vec![PreprocessInput {
                wide: base.join("test.csv"),
                long: base.join("pandas_test.csv"),
            }],
            combined: base.join("pandas.csv"),
        };

        let summary = run_preprocess(&config, &LevelVocabulary::standard()).unwrap();
        assert_eq!(summary.outputs[0].1, 0);
        assert_eq!(summary.combined.1, 0);

        for name in ["pandas_test.csv", "pandas.csv"] {
            let content = fs::read_to_string(base.join(name)).unwrap();
            assert_eq!(content, "Package,Date,Level,Value\n");
        }

        let records = crate::core::loaders::load_results_csv(base.join("pandas.csv")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_run_preprocess_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let config = PreprocessConfig {
            inputs: vec![PreprocessInput {
                wide: temp_dir.path().join("absent.csv"),
                long: temp_dir.path().join("long.csv"),
            }],
            combined: temp_dir.path().join("all.csv"),
        };

        assert!(run_preprocess(&config, &LevelVocabulary::standard()).is_err());
    }
}
