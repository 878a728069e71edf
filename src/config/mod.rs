//! Configuration types for the report pipeline.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::levels::LEVELS;

/// Errors raised when a configuration is internally inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no datasets configured")]
    NoDatasets,

    #[error("duplicate dataset name: {0}")]
    DuplicateDataset(String),

    #[error("numeric scope mode requires numeric level labels, got '{0}'")]
    NonNumericLevel(String),

    #[error("invalid render setting: {0}")]
    InvalidRender(String),
}

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the long-format result CSVs
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Directory receiving the rendered plots
    #[serde(default = "default_results_dir")]
    pub output_dir: PathBuf,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("resources/results")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            output_dir: default_results_dir(),
        }
    }
}

/// One named dataset rendered by the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetConfig {
    /// Name used as the artifact stem (e.g. `test` -> `test.pdf`)
    pub name: String,

    /// CSV file, relative to `paths.results_dir` unless absolute
    pub file: PathBuf,

    /// Also render one whole+scoped pair per package
    #[serde(default)]
    pub per_package: bool,
}

impl DatasetConfig {
    pub fn new(name: &str, file: &str, per_package: bool) -> Self {
        Self {
            name: name.to_string(),
            file: PathBuf::from(file),
            per_package,
        }
    }
}

fn default_datasets() -> Vec<DatasetConfig> {
    vec![
        DatasetConfig::new("test", "pandas_test.csv", true),
        DatasetConfig::new("train", "pandas_train.csv", false),
        DatasetConfig::new("all", "pandas.csv", true),
    ]
}

/// How a row's level is compared against the scope threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    /// Compare the numeric value of the label (`"5.6"` -> 5.6)
    #[default]
    Numeric,
    /// Compare the position of the label in the vocabulary
    Ordinal,
}

/// Language level vocabulary and scoping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelsConfig {
    /// Ordered level labels, oldest first
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// Rows with a level above this value form the scoped subset
    #[serde(default = "default_scope_threshold")]
    pub scope_threshold: f64,

    #[serde(default)]
    pub scope_mode: ScopeMode,
}

fn default_labels() -> Vec<String> {
    LEVELS.iter().map(|s| s.to_string()).collect()
}

fn default_scope_threshold() -> f64 {
    5.5
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            labels: default_labels(),
            scope_threshold: default_scope_threshold(),
            scope_mode: ScopeMode::default(),
        }
    }
}

/// File format written for each plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Svg => "svg",
        }
    }
}

/// Figure settings for the surface plots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Figure width in inches
    #[serde(default = "default_figure_inches")]
    pub width_in: f64,

    /// Figure height in inches
    #[serde(default = "default_figure_inches")]
    pub height_in: f64,

    /// Pixels per inch of the intermediate SVG (PDF pages use 72 per inch)
    #[serde(default = "default_dpi")]
    pub dpi: f64,

    /// Years between major gridlines on the release date axis
    #[serde(default = "default_year_step")]
    pub year_step: i32,

    /// Camera rotation around the vertical axis (radians)
    #[serde(default = "default_yaw")]
    pub yaw: f64,

    /// Camera elevation (radians)
    #[serde(default = "default_pitch")]
    pub pitch: f64,

    /// Zoom factor of the 3D projection
    #[serde(default = "default_scale")]
    pub scale: f64,

    #[serde(default)]
    pub format: OutputFormat,
}

fn default_figure_inches() -> f64 {
    10.0
}

fn default_dpi() -> f64 {
    72.0
}

fn default_year_step() -> i32 {
    5
}

fn default_yaw() -> f64 {
    0.7
}

fn default_pitch() -> f64 {
    0.35
}

fn default_scale() -> f64 {
    0.8
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width_in: default_figure_inches(),
            height_in: default_figure_inches(),
            dpi: default_dpi(),
            year_step: default_year_step(),
            yaw: default_yaw(),
            pitch: default_pitch(),
            scale: default_scale(),
            format: OutputFormat::default(),
        }
    }
}

impl RenderConfig {
    /// Figure size in pixels at the configured dpi.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi).round() as u32,
            (self.height_in * self.dpi).round() as u32,
        )
    }
}

/// One wide table converted by the preprocess step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessInput {
    /// Wide table: `Package, Version, Date, <level>...`
    pub wide: PathBuf,

    /// Long table written for this input: `Package, Date, Level, Value`
    pub long: PathBuf,
}

/// Wide-to-long conversion of the analysis result tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "default_preprocess_inputs")]
    pub inputs: Vec<PreprocessInput>,

    /// Long table receiving the rows of every input
    #[serde(default = "default_combined")]
    pub combined: PathBuf,
}

fn default_preprocess_inputs() -> Vec<PreprocessInput> {
    vec![
        PreprocessInput {
            wide: PathBuf::from("results/test.csv"),
            long: PathBuf::from("resources/results/pandas_test.csv"),
        },
        PreprocessInput {
            wide: PathBuf::from("results/train.csv"),
            long: PathBuf::from("resources/results/pandas_train.csv"),
        },
    ]
}

fn default_combined() -> PathBuf {
    PathBuf::from("resources/results/pandas.csv")
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            inputs: default_preprocess_inputs(),
            combined: default_combined(),
        }
    }
}

/// Main report configuration combining all sub-configs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default = "default_datasets")]
    pub datasets: Vec<DatasetConfig>,

    #[serde(default)]
    pub levels: LevelsConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub preprocess: PreprocessConfig,

    /// Log and skip failing plots instead of aborting the run
    #[serde(default)]
    pub keep_going: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            datasets: default_datasets(),
            levels: LevelsConfig::default(),
            render: RenderConfig::default(),
            preprocess: PreprocessConfig::default(),
            keep_going: false,
        }
    }
}

impl ReportConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ReportConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve a dataset's CSV path against the results directory.
    pub fn dataset_path(&self, dataset: &DatasetConfig) -> PathBuf {
        if dataset.file.is_absolute() {
            dataset.file.clone()
        } else {
            self.paths.results_dir.join(&dataset.file)
        }
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.datasets.is_empty() {
            return Err(ConfigError::NoDatasets);
        }

        for (i, dataset) in self.datasets.iter().enumerate() {
            if self.datasets[..i].iter().any(|d| d.name == dataset.name) {
                return Err(ConfigError::DuplicateDataset(dataset.name.clone()));
            }
        }

        if self.levels.scope_mode == ScopeMode::Numeric {
            if let Some(label) = self
                .levels
                .labels
                .iter()
                .find(|l| l.trim().parse::<f64>().is_err())
            {
                return Err(ConfigError::NonNumericLevel(label.clone()));
            }
        }

        let render = &self.render;
        if render.width_in <= 0.0 || render.height_in <= 0.0 || render.dpi <= 0.0 {
            return Err(ConfigError::InvalidRender(
                "figure size and dpi must be positive".to_string(),
            ));
        }
        if render.year_step <= 0 {
            return Err(ConfigError::InvalidRender(
                "year_step must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
