//! Core data types and I/O operations.

pub mod levels;
pub mod loaders;
pub mod transforms;
pub mod writers;

pub use levels::{LevelError, LevelVocabulary, LEVELS};
pub use loaders::{load_results_csv, Dataset, LoaderError, ResultRecord, ResultRow};
pub use transforms::{derive_columns, ScopeFilter, TransformError};
pub use writers::{write_artifact, LongCsvWriter, LongRecord, WriteError};
