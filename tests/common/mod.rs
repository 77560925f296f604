//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestDataset, SONG_1_LINE};
//!
//! #[test]
//! fn test_load_song() {
//!     let dataset = TestDataset::new().with_song_file("A/A/A", SONG_1_LINE);
//!     let report = dataset.run_etl().unwrap();
//!     assert_eq!(report.files, 1);
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::*;
