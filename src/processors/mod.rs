//! Pipeline stages built on the core data types.

pub mod preprocess;
pub mod report;

// Re-export key types for convenience
pub use preprocess::{melt_wide_csv, run_preprocess, PreprocessError, PreprocessSummary, WideLayout};
pub use report::{load_dataset, run_report, ReportError, ReportSummary, Reporter};
