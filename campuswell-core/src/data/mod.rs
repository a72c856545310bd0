//! Data access: declared schema, sources with fallback, typed dataset,
//! and stratified partitioning.

pub mod dataset;
pub mod schema;
pub mod source;
pub mod split;
pub mod store;

pub use dataset::Dataset;
pub use schema::{FeatureSchema, StudentRecord};
pub use source::{CsvSource, DataBatch, DataSource, DataSourceInfo, SqliteSource, resolve_dataset};
pub use store::import_csv_to_sqlite;
pub use split::{FoldIndices, StratifiedKFold, stratified_split_indices, train_test_split};
