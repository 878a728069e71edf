//! Report orchestration: whole, scoped and per-package surface plots.
//!
//! For every configured dataset the report renders `<name>` (all rows) and
//! `<name>_scoped` (rows above the level threshold). Datasets flagged with
//! `per_package` additionally get one such pair per distinct package, named
//! after the package.

use std::path::{Component, Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::config::{DatasetConfig, ReportConfig};
use crate::core::levels::LevelVocabulary;
use crate::core::loaders::{load_results_csv, Dataset, LoaderError};
use crate::core::transforms::{
    derive_columns, distinct_packages, filter_package, ScopeFilter, TransformError,
};
use crate::visualization::{SurfaceRenderer, VisualizationError};

/// Suffix appended to the artifact name of a scoped render.
pub const SCOPED_SUFFIX: &str = "_scoped";

/// Errors that can occur while producing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to load dataset '{name}': {source}")]
    Load {
        name: String,
        #[source]
        source: LoaderError,
    },

    #[error("failed to derive columns for dataset '{name}': {source}")]
    Derive {
        name: String,
        #[source]
        source: TransformError,
    },

    #[error("failed to render '{artifact}': {source}")]
    Render {
        artifact: String,
        #[source]
        source: VisualizationError,
    },

    #[error("invalid artifact name: '{0}'")]
    InvalidArtifactName(String),
}

/// Outcome of a report run.
#[derive(Debug, Default)]
pub struct ReportSummary {
    /// Artifacts written, in render order
    pub written: Vec<PathBuf>,
    /// Artifacts skipped when failures are isolated: (name, reason)
    pub failed: Vec<(String, String)>,
}

/// Renders datasets and their subsets into an output directory.
pub struct Reporter<'a, R: SurfaceRenderer + ?Sized> {
    renderer: &'a R,
    vocab: &'a LevelVocabulary,
    scope: ScopeFilter,
    output_dir: PathBuf,
    keep_going: bool,
    summary: ReportSummary,
}

impl<'a, R: SurfaceRenderer + ?Sized> Reporter<'a, R> {
    pub fn new(
        renderer: &'a R,
        vocab: &'a LevelVocabulary,
        scope: ScopeFilter,
        output_dir: impl Into<PathBuf>,
        keep_going: bool,
    ) -> Self {
        Self {
            renderer,
            vocab,
            scope,
            output_dir: output_dir.into(),
            keep_going,
            summary: ReportSummary::default(),
        }
    }

    pub fn from_config(config: &ReportConfig, vocab: &'a LevelVocabulary, renderer: &'a R) -> Self {
        Self::new(
            renderer,
            vocab,
            ScopeFilter::from_config(&config.levels),
            config.paths.output_dir.clone(),
            config.keep_going,
        )
    }

    /// Output path for an artifact name.
    ///
    /// Names may contain `/` (packages are often `vendor/name`) but must stay
    /// inside the output directory.
    pub fn artifact_path(&self, name: &str) -> Result<PathBuf, ReportError> {
        let relative = Path::new(name);
        let contained = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(ReportError::InvalidArtifactName(name.to_string()));
        }

        Ok(self
            .output_dir
            .join(format!("{}.{}", name, self.renderer.extension())))
    }

    /// Render one dataset to `<output_dir>/<name>.<ext>`.
    pub fn render(&mut self, dataset: &Dataset, name: &str) -> Result<(), ReportError> {
        let path = match self.artifact_path(name) {
            Ok(path) => path,
            Err(e) => return self.fail(name, e),
        };

        info!("Rendering '{}' ({} rows) -> {}", name, dataset.len(), path.display());

        match self.renderer.render(dataset, &path) {
            Ok(()) => {
                self.summary.written.push(path);
                Ok(())
            }
            Err(source) => self.fail(
                name,
                ReportError::Render {
                    artifact: name.to_string(),
                    source,
                },
            ),
        }
    }

    /// Render the whole dataset as `name` and its scoped subset as
    /// `name_scoped`.
    pub fn render_scoped_and_unscoped(
        &mut self,
        dataset: &Dataset,
        name: &str,
    ) -> Result<(), ReportError> {
        self.render(dataset, name)?;

        let scoped_name = format!("{}{}", name, SCOPED_SUFFIX);
        let scoped = self.scope.apply(dataset, &scoped_name, self.vocab);
        if scoped.is_empty() {
            warn!("Scoped subset '{}' is empty", scoped_name);
        }
        self.render(&scoped, &scoped_name)
    }

    /// Render the whole and scoped plots of one package.
    pub fn render_package(&mut self, dataset: &Dataset, package: &str) -> Result<(), ReportError> {
        let subset = filter_package(dataset, package);
        self.render_scoped_and_unscoped(&subset, package)
    }

    /// Render the whole and scoped plots of every package in the dataset.
    pub fn render_packages(&mut self, dataset: &Dataset) -> Result<(), ReportError> {
        let packages = distinct_packages(dataset);
        info!("Dataset '{}' has {} packages", dataset.name, packages.len());

        for package in &packages {
            self.render_package(dataset, package)?;
        }
        Ok(())
    }

    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    pub fn finish(self) -> ReportSummary {
        self.summary
    }

    fn fail(&mut self, name: &str, err: ReportError) -> Result<(), ReportError> {
        if !self.keep_going {
            return Err(err);
        }
        warn!("Skipping '{}': {}", name, err);
        self.summary.failed.push((name.to_string(), err.to_string()));
        Ok(())
    }
}

/// Load a configured dataset and derive its plot columns.
pub fn load_dataset(
    config: &ReportConfig,
    dataset: &DatasetConfig,
    vocab: &LevelVocabulary,
) -> Result<Dataset, ReportError> {
    let path = config.dataset_path(dataset);
    info!("Loading dataset '{}' from {}", dataset.name, path.display());

    let records = load_results_csv(&path).map_err(|source| ReportError::Load {
        name: dataset.name.clone(),
        source,
    })?;

    derive_columns(&dataset.name, records, vocab).map_err(|source| ReportError::Derive {
        name: dataset.name.clone(),
        source,
    })
}

/// Run the full report: load every dataset, render each one whole and
/// scoped, then break out the per-package datasets.
///
/// Loading is always fatal. Rendering failures abort the run unless
/// `keep_going` is set, in which case they are collected in the summary.
pub fn run_report<R: SurfaceRenderer + ?Sized>(
    config: &ReportConfig,
    vocab: &LevelVocabulary,
    renderer: &R,
) -> Result<ReportSummary, ReportError> {
    let datasets = config
        .datasets
        .iter()
        .map(|d| load_dataset(config, d, vocab).map(|loaded| (d, loaded)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut reporter = Reporter::from_config(config, vocab, renderer);

    for (cfg, dataset) in &datasets {
        reporter.render_scoped_and_unscoped(dataset, &cfg.name)?;
    }

    for (cfg, dataset) in datasets.iter().filter(|(cfg, _)| cfg.per_package) {
        info!("Rendering packages of '{}'", cfg.name);
        reporter.render_packages(dataset)?;
    }

    Ok(reporter.finish())
}
