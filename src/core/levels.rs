//! The ordered language level vocabulary.
//!
//! Labels are ordered oldest first. A label's position in the vocabulary is
//! its ordinal (`LevelFormat`), which is what the surface plots use as the
//! x coordinate.

use std::collections::HashMap;

use thiserror::Error;

/// Language levels covered by the analysis, oldest first.
pub const LEVELS: [&str; 12] = [
    "5.2", "5.3", "5.4", "5.5", "5.6", "7.0", "7.1", "7.2", "7.3", "8.0", "8.1", "8.2",
];

/// Errors raised by vocabulary construction and lookup.
#[derive(Debug, Error, PartialEq)]
pub enum LevelError {
    #[error("level vocabulary is empty")]
    Empty,

    #[error("duplicate level label: {0}")]
    Duplicate(String),

    #[error("unknown language level: '{0}'")]
    Unknown(String),
}

/// Ordered level labels with a reverse lookup built once.
#[derive(Debug, Clone)]
pub struct LevelVocabulary {
    labels: Vec<String>,
    index: HashMap<String, usize>,
    numeric: Vec<Option<f64>>,
}

impl LevelVocabulary {
    /// Build a vocabulary from labels ordered oldest first.
    pub fn new<I, S>(labels: I) -> Result<Self, LevelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(|l| l.into().trim().to_string())
            .collect();

        if labels.is_empty() {
            return Err(LevelError::Empty);
        }

        let mut index = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if index.insert(label.clone(), i).is_some() {
                return Err(LevelError::Duplicate(label.clone()));
            }
        }

        let numeric = labels.iter().map(|l| l.parse::<f64>().ok()).collect();

        Ok(Self {
            labels,
            index,
            numeric,
        })
    }

    /// The fixed [`LEVELS`] vocabulary.
    pub fn standard() -> Self {
        let labels: Vec<String> = LEVELS.iter().map(|s| s.to_string()).collect();
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        let numeric = labels.iter().map(|l| l.parse::<f64>().ok()).collect();

        Self {
            labels,
            index,
            numeric,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label at an ordinal position.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Numeric value of the label at an ordinal position, if it parses.
    pub fn numeric_value(&self, index: usize) -> Option<f64> {
        self.numeric.get(index).copied().flatten()
    }

    /// Ordinal position of a raw label.
    ///
    /// The trimmed text is looked up first. Labels that went through a
    /// numeric column (`7` for `7.0`) are retried in their shortest
    /// round-trip form.
    pub fn index_of(&self, raw: &str) -> Result<usize, LevelError> {
        let trimmed = raw.trim();
        if let Some(&i) = self.index.get(trimmed) {
            return Ok(i);
        }

        if let Ok(value) = trimmed.parse::<f64>() {
            if let Some(&i) = self.index.get(&format!("{value:?}")) {
                return Ok(i);
            }
        }

        Err(LevelError::Unknown(trimmed.to_string()))
    }
}

impl Default for LevelVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}
