//! Per-file extractors: parse one NDJSON file and write its rows.

use super::LoadStats;
use crate::error::{EtlError, EtlResult};
use crate::records::{read_ndjson, LogRecord, PlayEvent, SongRecord};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tracing::debug;

/// SQLite's default cap on bound parameters per statement.
const MAX_BOUND_PARAMS: usize = 999;

const INSERT_SONGS: &str = "INSERT INTO songs (song_id, title, artist_id, year, duration) VALUES";
const SONGS_CONFLICT: &str = "ON CONFLICT(song_id) DO NOTHING";

const INSERT_ARTISTS: &str =
    "INSERT INTO artists (artist_id, name, location, latitude, longitude) VALUES";
const ARTISTS_CONFLICT: &str = "ON CONFLICT(artist_id) DO NOTHING";

const INSERT_PLAY_EVENTS: &str = "INSERT INTO play_events (seq, start_time, hour, day, week, month, year, weekday, user_id, first_name, last_name, gender, level, song, artist, length, session_id, location, user_agent) VALUES";

const INSERT_TIME_FROM_EVENTS: &str = "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
    SELECT start_time, hour, day, week, month, year, weekday FROM play_events WHERE true
    ON CONFLICT(start_time) DO NOTHING";

// One row per user, taken from their last event in the file.
const UPSERT_USERS_FROM_EVENTS: &str = "INSERT INTO users (user_id, first_name, last_name, gender, level)
    SELECT user_id, first_name, last_name, gender, level FROM play_events p
    WHERE p.seq = (SELECT MAX(q.seq) FROM play_events q WHERE q.user_id = p.user_id)
    ON CONFLICT(user_id) DO UPDATE SET
        first_name = excluded.first_name,
        last_name = excluded.last_name,
        gender = excluded.gender,
        level = excluded.level";

const INSERT_SONGPLAYS_FROM_EVENTS: &str = "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
    SELECT p.start_time, p.user_id, p.level, m.song_id, m.artist_id, p.session_id, p.location, p.user_agent
    FROM play_events p
    LEFT JOIN (
        SELECT s.song_id, s.artist_id, s.title, a.name AS artist_name, s.duration,
            ROW_NUMBER() OVER (PARTITION BY s.title, a.name, s.duration ORDER BY s.rowid) AS rn
        FROM songs s JOIN artists a ON a.artist_id = s.artist_id
    ) m ON m.title = p.song AND m.artist_name = p.artist AND m.duration = p.length AND m.rn = 1
    ORDER BY p.seq";

/// Inserts `rows` with as few multi-row `INSERT` statements as the bound
/// parameter limit allows. Returns the number of rows actually written.
fn insert_batch(
    conn: &Connection,
    insert: &str,
    on_conflict: &str,
    rows: &[Vec<Value>],
) -> EtlResult<usize> {
    let Some(width) = rows.first().map(|r| r.len()) else {
        return Ok(0);
    };
    let placeholders = format!("({})", vec!["?"; width].join(", "));
    let rows_per_statement = (MAX_BOUND_PARAMS / width).max(1);

    let mut written = 0;
    for chunk in rows.chunks(rows_per_statement) {
        let sql = format!(
            "{} {} {}",
            insert,
            vec![placeholders.as_str(); chunk.len()].join(", "),
            on_conflict
        );
        written += conn.execute(&sql, params_from_iter(chunk.iter().flatten()))?;
    }
    Ok(written)
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn opt_text(value: &Option<String>) -> Value {
    value.as_deref().map(text).unwrap_or(Value::Null)
}

fn opt_real(value: Option<f64>) -> Value {
    value.map(Value::Real).unwrap_or(Value::Null)
}

fn song_row(song: &SongRecord) -> Vec<Value> {
    vec![
        text(&song.song_id),
        text(&song.title),
        text(&song.artist_id),
        song.year.map(Value::Integer).unwrap_or(Value::Null),
        opt_real(song.duration),
    ]
}

fn artist_row(song: &SongRecord) -> Vec<Value> {
    vec![
        text(&song.artist_id),
        text(&song.artist_name),
        opt_text(&song.artist_location),
        opt_real(song.artist_latitude),
        opt_real(song.artist_longitude),
    ]
}

fn play_event_row(seq: usize, event: &PlayEvent) -> Vec<Value> {
    let time = &event.time;
    vec![
        Value::Integer(seq as i64),
        Value::Text(time.start_time_text()),
        Value::Integer(time.hour.into()),
        Value::Integer(time.day.into()),
        Value::Integer(time.week.into()),
        Value::Integer(time.month.into()),
        Value::Integer(time.year.into()),
        Value::Integer(time.weekday.into()),
        text(&event.user_id),
        opt_text(&event.first_name),
        opt_text(&event.last_name),
        opt_text(&event.gender),
        text(&event.level),
        opt_text(&event.song),
        opt_text(&event.artist),
        opt_real(event.length),
        Value::Integer(event.session_id),
        opt_text(&event.location),
        opt_text(&event.user_agent),
    ]
}

/// Loads a song-metadata file: one `songs` and one `artists` row per record.
///
/// Songs and artists already present are left untouched.
pub fn process_song_file(conn: &Connection, path: &Path) -> EtlResult<LoadStats> {
    let records: Vec<(usize, SongRecord)> = read_ndjson(path)?;
    if records.is_empty() {
        return Err(EtlError::malformed(path, 0, "no song record in file"));
    }

    let songs: Vec<Vec<Value>> = records.iter().map(|(_, s)| song_row(s)).collect();
    let artists: Vec<Vec<Value>> = records.iter().map(|(_, s)| artist_row(s)).collect();

    let stats = LoadStats {
        songs: insert_batch(conn, INSERT_SONGS, SONGS_CONFLICT, &songs)?,
        artists: insert_batch(conn, INSERT_ARTISTS, ARTISTS_CONFLICT, &artists)?,
        ..Default::default()
    };
    debug!("{:?}: {:?}", path, stats);
    Ok(stats)
}

/// Loads an activity-log file.
///
/// Only `NextSong` events are kept. Each one yields a `time` row (ignored if
/// the instant is already present), refreshes its user and appends one
/// `songplays` row whose song and artist ids are resolved by exact title,
/// artist name and duration match.
pub fn process_log_file(conn: &Connection, path: &Path) -> EtlResult<LoadStats> {
    let records: Vec<(usize, LogRecord)> = read_ndjson(path)?;
    let total = records.len();

    let mut rows = Vec::new();
    for (line, record) in records {
        if !record.is_song_play() {
            continue;
        }
        let event = record
            .into_play_event()
            .map_err(|reason| EtlError::malformed(path, line, reason))?;
        rows.push(play_event_row(rows.len(), &event));
    }
    debug!("{:?}: {} of {} events are song plays", path, rows.len(), total);

    conn.execute("DELETE FROM play_events", [])?;
    if rows.is_empty() {
        return Ok(LoadStats::default());
    }
    insert_batch(conn, INSERT_PLAY_EVENTS, "", &rows)?;

    let stats = LoadStats {
        time: conn.execute(INSERT_TIME_FROM_EVENTS, [])?,
        users: conn.execute(UPSERT_USERS_FROM_EVENTS, [])?,
        songplays: conn.execute(INSERT_SONGPLAYS_FROM_EVENTS, [])?,
        ..Default::default()
    };
    conn.execute("DELETE FROM play_events", [])?;
    Ok(stats)
}
