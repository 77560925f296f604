//! Redshift statements for warehouse-mode loading.
//!
//! Raw JSON is bulk-copied from S3 into two staging tables, then the five
//! analytics tables are filled from staging with set-based inserts.

use crate::config::WarehouseSettings;

/// Region of the S3 buckets holding the source data.
pub const S3_REGION: &str = "us-west-2";

const STAGING_EVENTS_TABLE_DROP: &str = "DROP TABLE IF EXISTS staging_events;";
const STAGING_SONGS_TABLE_DROP: &str = "DROP TABLE IF EXISTS staging_songs;";
const SONGPLAY_TABLE_DROP: &str = "DROP TABLE IF EXISTS songplays;";
const USER_TABLE_DROP: &str = "DROP TABLE IF EXISTS users;";
const SONG_TABLE_DROP: &str = "DROP TABLE IF EXISTS songs;";
const ARTIST_TABLE_DROP: &str = "DROP TABLE IF EXISTS artists;";
const TIME_TABLE_DROP: &str = "DROP TABLE IF EXISTS time;";

const STAGING_EVENTS_TABLE_TRUNCATE: &str = "TRUNCATE staging_events;";
const STAGING_SONGS_TABLE_TRUNCATE: &str = "TRUNCATE staging_songs;";

const STAGING_EVENTS_TABLE_CREATE: &str = r#"
CREATE TABLE staging_events (
    artist          VARCHAR,
    auth            VARCHAR,
    first_name      VARCHAR,
    gender          CHAR,
    item_in_session INT,
    last_name       VARCHAR,
    length          FLOAT,
    level           VARCHAR,
    location        VARCHAR,
    method          VARCHAR,
    page            VARCHAR,
    registration    BIGINT,
    session_id      INT,
    song            VARCHAR,
    status          INT,
    ts              BIGINT,
    user_agent      VARCHAR,
    user_id         VARCHAR
);"#;

const STAGING_SONGS_TABLE_CREATE: &str = r#"
CREATE TABLE staging_songs (
    num_songs        INT,
    artist_id        VARCHAR,
    artist_latitude  FLOAT,
    artist_longitude FLOAT,
    artist_location  VARCHAR,
    artist_name      VARCHAR,
    song_id          VARCHAR,
    title            VARCHAR,
    duration         FLOAT,
    year             INT
);"#;

const SONGPLAY_TABLE_CREATE: &str = r#"
CREATE TABLE songplays (
    songplay_id INT IDENTITY(0,1) NOT NULL PRIMARY KEY,
    start_time  TIMESTAMP NOT NULL SORTKEY,
    user_id     VARCHAR NOT NULL,
    level       VARCHAR NOT NULL,
    song_id     VARCHAR DISTKEY,
    artist_id   VARCHAR,
    session_id  INT NOT NULL,
    location    VARCHAR,
    user_agent  VARCHAR
);"#;

const USER_TABLE_CREATE: &str = r#"
CREATE TABLE users (
    user_id    VARCHAR NOT NULL PRIMARY KEY SORTKEY,
    first_name VARCHAR,
    last_name  VARCHAR,
    gender     CHAR,
    level      VARCHAR NOT NULL
) DISTSTYLE ALL;"#;

const SONG_TABLE_CREATE: &str = r#"
CREATE TABLE songs (
    song_id   VARCHAR NOT NULL PRIMARY KEY DISTKEY,
    title     VARCHAR NOT NULL,
    artist_id VARCHAR NOT NULL,
    year      INT,
    duration  FLOAT
);"#;

const ARTIST_TABLE_CREATE: &str = r#"
CREATE TABLE artists (
    artist_id VARCHAR NOT NULL PRIMARY KEY SORTKEY,
    name      VARCHAR NOT NULL,
    location  VARCHAR,
    latitude  FLOAT,
    longitude FLOAT
) DISTSTYLE ALL;"#;

const TIME_TABLE_CREATE: &str = r#"
CREATE TABLE time (
    start_time TIMESTAMP NOT NULL PRIMARY KEY SORTKEY,
    hour       INT NOT NULL,
    day        INT NOT NULL,
    week       INT NOT NULL,
    month      INT NOT NULL,
    year       INT NOT NULL,
    weekday    INT NOT NULL
) DISTSTYLE ALL;"#;

const SONGPLAY_TABLE_INSERT: &str = r#"
INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT TIMESTAMP 'epoch' + se.ts / 1000.0 * INTERVAL '1 second',
       se.user_id,
       se.level,
       ss.song_id,
       ss.artist_id,
       se.session_id,
       se.location,
       se.user_agent
FROM staging_events se
-- Staging rows carry no load order, so ties on (title, artist, duration)
-- resolve to the lowest song_id.
LEFT JOIN (
    SELECT song_id, artist_id, title, artist_name, duration,
           ROW_NUMBER() OVER (PARTITION BY title, artist_name, duration ORDER BY song_id) AS rn
    FROM staging_songs
) ss ON se.song = ss.title
    AND se.artist = ss.artist_name
    AND se.length = ss.duration
    AND ss.rn = 1
WHERE se.page = 'NextSong';"#;

// Latest event per user wins, so a level change is reflected once.
const USER_TABLE_INSERT: &str = r#"
INSERT INTO users (user_id, first_name, last_name, gender, level)
SELECT user_id, first_name, last_name, gender, level
FROM (
    SELECT user_id, first_name, last_name, gender, level,
           ROW_NUMBER() OVER (PARTITION BY user_id ORDER BY ts DESC) AS rn
    FROM staging_events
    WHERE page = 'NextSong' AND user_id IS NOT NULL AND user_id <> ''
)
WHERE rn = 1;"#;

const SONG_TABLE_INSERT: &str = r#"
INSERT INTO songs (song_id, title, artist_id, year, duration)
SELECT DISTINCT song_id, title, artist_id, year, duration
FROM staging_songs
WHERE song_id IS NOT NULL;"#;

const ARTIST_TABLE_INSERT: &str = r#"
INSERT INTO artists (artist_id, name, location, latitude, longitude)
SELECT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM (
    SELECT artist_id, artist_name, artist_location, artist_latitude, artist_longitude,
           ROW_NUMBER() OVER (PARTITION BY artist_id ORDER BY song_id) AS rn
    FROM staging_songs
    WHERE artist_id IS NOT NULL
)
WHERE rn = 1;"#;

// EXTRACT(DOW) counts from Sunday; shifted so that Monday is 0.
const TIME_TABLE_INSERT: &str = r#"
INSERT INTO time (start_time, hour, day, week, month, year, weekday)
SELECT start_time,
       EXTRACT(HOUR FROM start_time),
       EXTRACT(DAY FROM start_time),
       EXTRACT(WEEK FROM start_time),
       EXTRACT(MONTH FROM start_time),
       EXTRACT(YEAR FROM start_time),
       (EXTRACT(DOW FROM start_time) + 6) % 7
FROM (
    SELECT DISTINCT TIMESTAMP 'epoch' + ts / 1000.0 * INTERVAL '1 second' AS start_time
    FROM staging_events
    WHERE page = 'NextSong'
);"#;

/// Teardown, staging tables first.
pub fn drop_statements() -> Vec<&'static str> {
    vec![
        STAGING_EVENTS_TABLE_DROP,
        STAGING_SONGS_TABLE_DROP,
        SONGPLAY_TABLE_DROP,
        USER_TABLE_DROP,
        SONG_TABLE_DROP,
        ARTIST_TABLE_DROP,
        TIME_TABLE_DROP,
    ]
}

pub fn create_statements() -> Vec<&'static str> {
    vec![
        STAGING_EVENTS_TABLE_CREATE,
        STAGING_SONGS_TABLE_CREATE,
        SONGPLAY_TABLE_CREATE,
        USER_TABLE_CREATE,
        SONG_TABLE_CREATE,
        ARTIST_TABLE_CREATE,
        TIME_TABLE_CREATE,
    ]
}

/// Empties the staging tables so each run loads only its own COPY.
pub fn truncate_staging_statements() -> Vec<&'static str> {
    vec![STAGING_EVENTS_TABLE_TRUNCATE, STAGING_SONGS_TABLE_TRUNCATE]
}

/// Transform-and-insert from staging into the analytics tables.
pub fn insert_statements() -> Vec<&'static str> {
    vec![
        SONG_TABLE_INSERT,
        ARTIST_TABLE_INSERT,
        USER_TABLE_INSERT,
        TIME_TABLE_INSERT,
        SONGPLAY_TABLE_INSERT,
    ]
}

/// Bulk `COPY` statements loading S3 JSON into the staging tables.
pub fn copy_statements(settings: &WarehouseSettings) -> Vec<String> {
    let staging_events_copy = format!(
        "COPY staging_events FROM {} IAM_ROLE {} REGION {} FORMAT AS JSON {};",
        quote_literal(&settings.log_data),
        quote_literal(&settings.iam_role_arn),
        quote_literal(S3_REGION),
        quote_literal(&settings.log_jsonpath),
    );
    let staging_songs_copy = format!(
        "COPY staging_songs FROM {} IAM_ROLE {} REGION {} FORMAT AS JSON 'auto';",
        quote_literal(&settings.song_data),
        quote_literal(&settings.iam_role_arn),
        quote_literal(S3_REGION),
    );
    vec![staging_events_copy, staging_songs_copy]
}

/// Wraps a value in single quotes, doubling any embedded quote.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::NEXT_SONG_PAGE;

    fn settings() -> WarehouseSettings {
        WarehouseSettings {
            host: "cluster.example.com".to_string(),
            port: 5439,
            db_name: "dev".to_string(),
            db_user: "etl".to_string(),
            db_password: "secret".to_string(),
            log_data: "s3://bucket/log_data".to_string(),
            log_jsonpath: "s3://bucket/log_json_path.json".to_string(),
            song_data: "s3://bucket/song_data".to_string(),
            iam_role_arn: "arn:aws:iam::123456789012:role/dwhRole".to_string(),
        }
    }

    #[test]
    fn statement_lists_cover_all_seven_tables() {
        assert_eq!(drop_statements().len(), 7);
        assert_eq!(create_statements().len(), 7);
        for table in [
            "staging_events",
            "staging_songs",
            "songplays",
            "users",
            "songs",
            "artists",
            "time",
        ] {
            assert!(drop_statements()
                .iter()
                .any(|s| s.contains(&format!("DROP TABLE IF EXISTS {};", table))));
            assert!(create_statements()
                .iter()
                .any(|s| s.contains(&format!("CREATE TABLE {} (", table))));
        }
    }

    #[test]
    fn songplays_are_inserted_after_songs_and_artists() {
        let inserts = insert_statements();
        let position = |table: &str| {
            inserts
                .iter()
                .position(|s| s.contains(&format!("INSERT INTO {} (", table)))
                .unwrap()
        };
        assert!(position("songs") < position("songplays"));
        assert!(position("artists") < position("songplays"));
    }

    #[test]
    fn truncates_cover_both_staging_tables() {
        assert_eq!(
            truncate_staging_statements(),
            vec!["TRUNCATE staging_events;", "TRUNCATE staging_songs;"]
        );
    }

    #[test]
    fn copy_statements_use_injected_settings() {
        let copies = copy_statements(&settings());
        assert_eq!(copies.len(), 2);

        assert!(copies[0].starts_with("COPY staging_events FROM 's3://bucket/log_data'"));
        assert!(copies[0].contains("IAM_ROLE 'arn:aws:iam::123456789012:role/dwhRole'"));
        assert!(copies[0].contains("REGION 'us-west-2'"));
        assert!(copies[0].contains("FORMAT AS JSON 's3://bucket/log_json_path.json'"));

        assert!(copies[1].starts_with("COPY staging_songs FROM 's3://bucket/song_data'"));
        assert!(copies[1].contains("FORMAT AS JSON 'auto'"));
    }

    #[test]
    fn quote_literal_escapes_single_quotes() {
        assert_eq!(quote_literal("s3://it's"), "'s3://it''s'");
    }

    #[test]
    fn event_derived_inserts_only_read_playback_events() {
        for statement in [SONGPLAY_TABLE_INSERT, USER_TABLE_INSERT, TIME_TABLE_INSERT] {
            assert!(statement.contains(&format!("'{}'", NEXT_SONG_PAGE)));
        }
    }
}
