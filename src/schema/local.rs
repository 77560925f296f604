//! SQLite schema for direct-mode loading.
//!
//! Star schema with `songplays` as the fact table and `users`, `songs`,
//! `artists` and `time` as dimensions. Tables are listed so that referenced
//! tables are created first and dropped last.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("artist_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("location", &SqlType::Text),
        sqlite_column!("latitude", &SqlType::Real),
        sqlite_column!("longitude", &SqlType::Real),
    ],
    indices: &[("idx_artists_name", "name")],
};

const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("song_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist_id", &SqlType::Text, non_null = true),
        sqlite_column!("year", &SqlType::Integer),
        // Kept as REAL: songplay resolution matches on exact duration
        sqlite_column!("duration", &SqlType::Real),
    ],
    indices: &[
        ("idx_songs_title", "title"),
        ("idx_songs_artist_id", "artist_id"),
    ],
};

const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("user_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("first_name", &SqlType::Text),
        sqlite_column!("last_name", &SqlType::Text),
        sqlite_column!("gender", &SqlType::Text),
        sqlite_column!("level", &SqlType::Text, non_null = true), // 'free', 'paid'
    ],
    indices: &[],
};

const TIME_TABLE: Table = Table {
    name: "time",
    columns: &[
        sqlite_column!("start_time", &SqlType::Text, is_primary_key = true), // UTC, millisecond precision
        sqlite_column!("hour", &SqlType::Integer, non_null = true),
        sqlite_column!("day", &SqlType::Integer, non_null = true),
        // ISO week
        sqlite_column!("week", &SqlType::Integer, non_null = true),
        sqlite_column!("month", &SqlType::Integer, non_null = true),
        sqlite_column!("year", &SqlType::Integer, non_null = true),
        sqlite_column!("weekday", &SqlType::Integer, non_null = true), // 0 = Monday
    ],
    indices: &[],
};

const SONGPLAYS_TABLE: Table = Table {
    name: "songplays",
    columns: &[
        sqlite_column!("songplay_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "start_time",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "time",
                foreign_column: "start_time",
                on_delete: ForeignKeyOnChange::NoAction,
            })
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "users",
                foreign_column: "user_id",
                on_delete: ForeignKeyOnChange::NoAction,
            })
        ),
        sqlite_column!("level", &SqlType::Text, non_null = true),
        // Null when no song matched on title, artist name and duration
        sqlite_column!("song_id", &SqlType::Text),
        sqlite_column!("artist_id", &SqlType::Text),
        sqlite_column!("session_id", &SqlType::Integer, non_null = true),
        sqlite_column!("location", &SqlType::Text),
        sqlite_column!("user_agent", &SqlType::Text),
    ],
    indices: &[
        ("idx_songplays_start_time", "start_time"),
        ("idx_songplays_user_id", "user_id"),
    ],
};

pub const SPARKIFY_SCHEMA: VersionedSchema = VersionedSchema {
    version: 1,
    tables: &[
        ARTISTS_TABLE,
        SONGS_TABLE,
        USERS_TABLE,
        TIME_TABLE,
        SONGPLAYS_TABLE,
    ],
};

/// Names of the persistent tables, in creation order.
pub fn table_names() -> Vec<&'static str> {
    SPARKIFY_SCHEMA.tables.iter().map(|t| t.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn drop_order_removes_fact_table_first() {
        let drops = SPARKIFY_SCHEMA.drop_statements();
        assert_eq!(drops.len(), 5);
        assert_eq!(drops[0], "DROP TABLE IF EXISTS songplays;");
        assert_eq!(drops[4], "DROP TABLE IF EXISTS artists;");
    }

    #[test]
    fn create_order_puts_dimensions_before_songplays() {
        let creates = SPARKIFY_SCHEMA.create_statements();
        let songplays = creates
            .iter()
            .position(|s| s.starts_with("CREATE TABLE songplays"))
            .unwrap();
        for dimension in ["artists", "songs", "users", "time"] {
            let position = creates
                .iter()
                .position(|s| s.starts_with(&format!("CREATE TABLE {} ", dimension)))
                .unwrap();
            assert!(position < songplays, "{} created after songplays", dimension);
        }
    }

    #[test]
    fn schema_can_be_recreated_after_drop() {
        let conn = Connection::open_in_memory().unwrap();
        SPARKIFY_SCHEMA.create(&conn).unwrap();
        SPARKIFY_SCHEMA.drop(&conn).unwrap();
        SPARKIFY_SCHEMA.create(&conn).unwrap();
        SPARKIFY_SCHEMA.validate(&conn).unwrap();
        assert_eq!(
            table_names(),
            vec!["artists", "songs", "users", "time", "songplays"]
        );
    }
}
