//! SQLite destination for direct-mode loading.

mod extract;

pub use extract::{process_log_file, process_song_file};

use crate::error::{EtlError, EtlResult};
use crate::schema::local::table_names;
use crate::schema::SPARKIFY_SCHEMA;
use rusqlite::{Connection, OpenFlags, Transaction};
use std::ops::AddAssign;
use std::path::Path;
use tracing::{debug, info};

/// Scratch table holding one log file's retained events while they are
/// fanned out into `time`, `users` and `songplays`.
const PLAY_EVENTS_TEMP_TABLE: &str = "CREATE TEMP TABLE IF NOT EXISTS play_events (
    seq INTEGER PRIMARY KEY,
    start_time TEXT NOT NULL,
    hour INTEGER NOT NULL,
    day INTEGER NOT NULL,
    week INTEGER NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    weekday INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    first_name TEXT,
    last_name TEXT,
    gender TEXT,
    level TEXT NOT NULL,
    song TEXT,
    artist TEXT,
    length REAL,
    session_id INTEGER NOT NULL,
    location TEXT,
    user_agent TEXT
)";

/// Rows written to each table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time: usize,
    pub songplays: usize,
}

impl AddAssign for LoadStats {
    fn add_assign(&mut self, other: Self) {
        self.songs += other.songs;
        self.artists += other.artists;
        self.users += other.users;
        self.time += other.time;
        self.songplays += other.songplays;
    }
}

/// What to do with the schema when a database is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SchemaSetup {
    CreateIfEmpty,
    Recreate,
    ValidateOnly,
}

/// The single database session of a direct-mode run.
pub struct SqliteSparkifyStore {
    conn: Connection,
}

impl SqliteSparkifyStore {
    /// Opens (or creates) the database at `db_path`.
    ///
    /// A database without tables gets the schema created; an existing one
    /// must match the schema.
    pub fn open<P: AsRef<Path>>(db_path: P) -> EtlResult<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        info!("Opened SQLite database at {:?}", db_path.as_ref());
        Self::init(conn, SchemaSetup::CreateIfEmpty)
    }

    /// Opens an existing database without creating or altering anything, and
    /// checks it against the schema.
    pub fn open_existing<P: AsRef<Path>>(db_path: P) -> EtlResult<Self> {
        let db_path = db_path.as_ref();
        if !db_path.is_file() {
            return Err(EtlError::MissingFile(db_path.to_path_buf()));
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(db_path, flags)?;
        info!("Opened existing SQLite database at {:?}", db_path);
        Self::init(conn, SchemaSetup::ValidateOnly)
    }

    /// Opens the database at `db_path`, dropping and recreating every table.
    pub fn recreate<P: AsRef<Path>>(db_path: P) -> EtlResult<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        info!("Recreating SQLite database at {:?}", db_path.as_ref());
        Self::init(conn, SchemaSetup::Recreate)
    }

    pub fn in_memory() -> EtlResult<Self> {
        Self::init(Connection::open_in_memory()?, SchemaSetup::CreateIfEmpty)
    }

    fn init(conn: Connection, setup: SchemaSetup) -> EtlResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )?;
        if setup == SchemaSetup::Recreate {
            debug!("Dropping tables: {}", table_names().join(", "));
            SPARKIFY_SCHEMA.drop(&conn)?;
            SPARKIFY_SCHEMA.create(&conn)?;
            info!("Created tables: {}", table_names().join(", "));
        } else if setup == SchemaSetup::CreateIfEmpty && table_count == 0 {
            info!("Creating schema at version {}", SPARKIFY_SCHEMA.version);
            SPARKIFY_SCHEMA.create(&conn)?;
        } else {
            SPARKIFY_SCHEMA.validate(&conn)?;
        }

        conn.execute(PLAY_EVENTS_TEMP_TABLE, [])?;
        Ok(Self { conn })
    }

    pub fn validate(&self) -> EtlResult<()> {
        SPARKIFY_SCHEMA.validate(&self.conn)
    }

    /// Starts the transaction covering one source file.
    pub fn begin_file(&mut self) -> EtlResult<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Row count of every persistent table, in creation order.
    pub fn table_counts(&self) -> EtlResult<Vec<(&'static str, i64)>> {
        table_names()
            .into_iter()
            .map(|name| {
                let count: i64 =
                    self.conn
                        .query_row(&format!("SELECT COUNT(*) FROM {}", name), [], |r| r.get(0))?;
                Ok((name, count))
            })
            .collect()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn close(self) -> EtlResult<()> {
        self.conn.close().map_err(|(_, e)| EtlError::Write(e))
    }
}
