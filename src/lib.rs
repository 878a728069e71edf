//! Language level surface reports.
//!
//! This crate provides tools for:
//! - Converting wide per-release result tables into long (package, date, level, value) tables
//! - Loading result tables and deriving plot coordinates from the level vocabulary
//! - Rendering triangulated 3D surface plots (level x release date x value) to PDF
//! - Breaking a dataset out into level-scoped and per-package reports
//!
//! # Example
//!
//! ```no_run
//! use modernity_report::{
//!     processors::report::run_report, visualization::PlottersRenderer, LevelVocabulary,
//!     ReportConfig,
//! };
//!
//! let config = ReportConfig::default();
//! let vocab = LevelVocabulary::standard();
//! let renderer = PlottersRenderer::new(config.render.clone(), &vocab);
//! let summary = run_report(&config, &vocab, &renderer).unwrap();
//! println!("{} plots written", summary.written.len());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{DatasetConfig, LevelsConfig, PathsConfig, RenderConfig, ReportConfig, ScopeMode};
pub use core::levels::{LevelVocabulary, LEVELS};
pub use core::loaders::{Dataset, ResultRow};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
