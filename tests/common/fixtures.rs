//! On-disk datasets for end-to-end tests

use sparkify_etl::{run_direct, PipelineReport, SqliteSparkifyStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary song/log directory pair plus a database path next to them.
pub struct TestDataset {
    pub dir: TempDir,
    pub song_dir: PathBuf,
    pub log_dir: PathBuf,
    pub db_path: PathBuf,
}

impl TestDataset {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let song_dir = dir.path().join("song_data");
        let log_dir = dir.path().join("log_data");
        fs::create_dir_all(&song_dir).unwrap();
        fs::create_dir_all(&log_dir).unwrap();
        let db_path = dir.path().join("sparkify.db");
        Self {
            dir,
            song_dir,
            log_dir,
            db_path,
        }
    }

    /// Writes a one-record song file under `song_data/<subdir>/`, named
    /// after the song id like the real dataset.
    pub fn with_song_file(self, subdir: &str, line: &str) -> Self {
        let song: serde_json::Value = serde_json::from_str(line).unwrap();
        let name = format!("{}.json", song["song_id"].as_str().unwrap());
        write_lines(&self.song_dir.join(subdir), &name, &[line]);
        self
    }

    pub fn with_log_file(self, name: &str, lines: &[&str]) -> Self {
        write_lines(&self.log_dir.join("2018/11"), name, lines);
        self
    }

    pub fn open_store(&self) -> SqliteSparkifyStore {
        SqliteSparkifyStore::open(&self.db_path).unwrap()
    }

    pub fn run_etl(&self) -> sparkify_etl::EtlResult<PipelineReport> {
        let mut store = self.open_store();
        let report = run_direct(&mut store, &self.song_dir, &self.log_dir, "json")?;
        store.close()?;
        Ok(report)
    }

    pub fn count(&self, table: &str) -> i64 {
        self.open_store()
            .connection()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }
}

fn write_lines(dir: &Path, name: &str, lines: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), lines.join("\n")).unwrap();
}
