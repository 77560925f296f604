//! Table definitions and statement lists for both load modes.
//!
//! * [`local`] declares the SQLite star schema used by direct-mode loading.
//! * [`warehouse`] holds the Redshift drop/create/copy/insert statements.

pub mod local;
pub mod warehouse;

pub use local::SPARKIFY_SCHEMA;
