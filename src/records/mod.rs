//! Source record models and the newline-delimited JSON reader.

mod log;
mod song;
mod time;

pub use log::{LogRecord, PlayEvent, NEXT_SONG_PAGE};
pub use song::SongRecord;
pub use time::TimeParts;

use crate::error::{EtlError, EtlResult};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reads every non-blank line of `path` as one JSON record.
///
/// Records are returned with their 1-based line number.
pub fn read_ndjson<T: DeserializeOwned>(path: &Path) -> EtlResult<Vec<(usize, T)>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            EtlError::MissingFile(path.to_path_buf())
        }
        _ => EtlError::Io(e),
    })?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str::<T>(&line)
            .map_err(|e| EtlError::malformed(path, index + 1, e.to_string()))?;
        records.push((index + 1, record));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn blank_lines_are_skipped_and_line_numbers_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(
            &path,
            "{\"page\":\"Home\",\"ts\":1}\n\n{\"page\":\"NextSong\",\"ts\":2}\n",
        )
        .unwrap();

        let records: Vec<(usize, LogRecord)> = read_ndjson(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, 1);
        assert_eq!(records[1].0, 3);
        assert_eq!(records[1].1.page.as_deref(), Some("NextSong"));
    }

    #[test]
    fn invalid_json_reports_path_and_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"page\":\"NextSong\"}\n{not json}\n").unwrap();

        let err = read_ndjson::<LogRecord>(&path).unwrap_err();
        match err {
            EtlError::MalformedRecord { path: p, line, .. } => {
                assert_eq!(p, path);
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_reported_as_such() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.json");

        let err = read_ndjson::<SongRecord>(&path).unwrap_err();
        assert!(matches!(err, EtlError::MissingFile(p) if p == path));
    }
}
