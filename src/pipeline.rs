//! Drives one extractor over every file of a data directory.

use crate::collector::collect_files;
use crate::error::EtlResult;
use crate::store::{process_log_file, process_song_file, LoadStats, SqliteSparkifyStore};
use rusqlite::Connection;
use std::ops::AddAssign;
use std::path::Path;
use tracing::info;

/// Loads one source file through an open session.
pub type Extractor = fn(&Connection, &Path) -> EtlResult<LoadStats>;

/// Outcome of one or more pipeline passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub files: usize,
    pub rows: LoadStats,
}

impl AddAssign for PipelineReport {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.rows += other.rows;
    }
}

/// Collects every `extension` file under `root` and runs `extract` on each
/// one, committing after every file.
///
/// The first failing file aborts the pass; its transaction is rolled back
/// and files committed before it stay loaded.
pub fn process_data(
    store: &mut SqliteSparkifyStore,
    root: &Path,
    extension: &str,
    extract: Extractor,
) -> EtlResult<PipelineReport> {
    let files = collect_files(root, extension)?;
    let total = files.len();
    info!("{} files found in {}", total, root.display());

    let mut report = PipelineReport::default();
    for (i, path) in files.iter().enumerate() {
        let tx = store.begin_file()?;
        let stats = extract(&tx, path)?;
        tx.commit()?;

        report.files += 1;
        report.rows += stats;
        info!("{}/{} files processed.", i + 1, total);
    }
    Ok(report)
}

/// Song pass then log pass, the order songplay resolution depends on.
pub fn run_direct(
    store: &mut SqliteSparkifyStore,
    song_data_dir: &Path,
    log_data_dir: &Path,
    extension: &str,
) -> EtlResult<PipelineReport> {
    let mut report = process_data(store, song_data_dir, extension, process_song_file)?;
    report += process_data(store, log_data_dir, extension, process_log_file)?;
    Ok(report)
}
