//! Loads song metadata and user activity logs into the Sparkify analytics
//! schema, either directly into SQLite or through Redshift staging tables.

pub mod collector;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod schema;
pub mod sqlite_persistence;
pub mod store;
pub mod warehouse;

pub use config::{AppConfig, CliConfig, LoadMode};
pub use error::{EtlError, EtlResult};
pub use pipeline::{process_data, run_direct, PipelineReport};
pub use store::{LoadStats, SqliteSparkifyStore};
