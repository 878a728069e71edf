//! Column derivation and dataset filtering.
//!
//! This module turns loaded result records into plot-ready rows and carves
//! out the subsets the report renders: the level-scoped subset and the
//! per-package subsets.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::levels::LevelVocabulary;
use super::loaders::{Dataset, ResultRecord, ResultRow};
use crate::config::{LevelsConfig, ScopeMode};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Errors raised while deriving plot columns.
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("row {row}: unknown language level '{level}'")]
    UnknownLevel { row: usize, level: String },
}

/// Convert a date-time to fractional days since 1970-01-01.
pub fn date_to_num(date: &NaiveDateTime) -> f64 {
    let utc = date.and_utc();
    utc.timestamp() as f64 / SECONDS_PER_DAY
        + utc.timestamp_subsec_nanos() as f64 / (SECONDS_PER_DAY * 1e9)
}

/// Inverse of [`date_to_num`], to the second.
pub fn num_to_date(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    let seconds = (days * SECONDS_PER_DAY).round() as i64;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}

/// Calendar year of a day number.
pub fn year_of(days: f64) -> Option<i32> {
    num_to_date(days).map(|d| d.year())
}

/// Day number of January 1st of `year`.
pub fn year_start(year: i32) -> Option<f64> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| date_to_num(&d))
}

/// Derive `LevelFormat` and `DateFormat` for every record.
///
/// Fails on the first record whose level is not in the vocabulary; no
/// partial dataset is returned.
pub fn derive_columns(
    name: &str,
    records: Vec<ResultRecord>,
    vocab: &LevelVocabulary,
) -> Result<Dataset, TransformError> {
    let mut rows = Vec::with_capacity(records.len());

    for (i, record) in records.into_iter().enumerate() {
        let level_format =
            vocab
                .index_of(&record.level)
                .map_err(|_| TransformError::UnknownLevel {
                    row: i + 1,
                    level: record.level.clone(),
                })?;
        let date_format = date_to_num(&record.date);

        rows.push(ResultRow {
            package: record.package,
            date: record.date,
            level: record.level,
            value: record.value,
            level_format,
            date_format,
        });
    }

    Ok(Dataset::new(name, rows))
}

/// Selects the rows whose level lies above a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeFilter {
    pub mode: ScopeMode,
    pub threshold: f64,
}

impl ScopeFilter {
    pub fn new(mode: ScopeMode, threshold: f64) -> Self {
        Self { mode, threshold }
    }

    pub fn from_config(config: &LevelsConfig) -> Self {
        Self::new(config.scope_mode, config.scope_threshold)
    }

    /// Whether a row belongs to the scoped subset.
    pub fn includes(&self, row: &ResultRow, vocab: &LevelVocabulary) -> bool {
        match self.mode {
            ScopeMode::Numeric => vocab
                .numeric_value(row.level_format)
                .map_or(false, |v| v > self.threshold),
            ScopeMode::Ordinal => row.level_format as f64 > self.threshold,
        }
    }

    /// The scoped subset of `dataset`, named `name`.
    pub fn apply(&self, dataset: &Dataset, name: &str, vocab: &LevelVocabulary) -> Dataset {
        dataset.filter(name, |row| self.includes(row, vocab))
    }
}

/// Rows belonging to one package; the subset is named after the package.
pub fn filter_package(dataset: &Dataset, package: &str) -> Dataset {
    dataset.filter(package, |row| row.package == package)
}

/// Distinct package names in first-seen order.
pub fn distinct_packages(dataset: &Dataset) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    dataset
        .iter()
        .filter(|row| seen.insert(row.package.as_str()))
        .map(|row| row.package.clone())
        .collect()
}
