//! Shared constants for end-to-end tests
//!
//! Song and log lines mirror the shape of the real Million Song Dataset and
//! event simulator files.

// ============================================================================
// Song metadata
// ============================================================================

pub const SONG_1_ID: &str = "S1";
pub const ARTIST_1_ID: &str = "A1";

/// "T1" by "AR1", 123.4 seconds
pub const SONG_1_LINE: &str = r#"{"song_id":"S1","title":"T1","artist_id":"A1","year":2000,"duration":123.4,"artist_name":"AR1","artist_location":"LOC","artist_latitude":1.0,"artist_longitude":2.0,"num_songs":1}"#;

/// Same title and artist as song 1 but a different duration
pub const SONG_2_LINE: &str = r#"{"song_id":"S2","title":"T1","artist_id":"A1","year":2001,"duration":200.0,"artist_name":"AR1","artist_location":"LOC","artist_latitude":1.0,"artist_longitude":2.0,"num_songs":1}"#;

/// Artist without location or coordinates
pub const SONG_3_LINE: &str = r#"{"num_songs":1,"artist_id":"ARD7TVE1187B99BFB1","artist_latitude":null,"artist_longitude":null,"artist_location":"","artist_name":"Casual","song_id":"SOMZWCG12A8C13C480","title":"I Didn't Mean To","duration":218.93179,"year":0}"#;

// ============================================================================
// Activity log
// ============================================================================

pub const PLAY_TS: i64 = 1542837407796;
pub const PLAY_START_TIME: &str = "2018-11-21 21:56:47.796";

/// User 7 plays song 1 on the free tier
pub const PLAY_1_LINE: &str = r#"{"page":"NextSong","song":"T1","artist":"AR1","length":123.4,"ts":1542837407796,"userId":"7","firstName":"F","lastName":"L","gender":"F","level":"free","sessionId":1,"location":"X","userAgent":"UA"}"#;

/// User 7, now paid, plays something that is not in the catalog
pub const PLAY_2_LINE: &str = r#"{"artist":"Pavement","auth":"Logged In","firstName":"F","gender":"F","itemInSession":1,"lastName":"L","length":99.16036,"level":"paid","location":"X","method":"PUT","page":"NextSong","registration":1540266185796.0,"sessionId":2,"song":"Mercy:The Laundromat","status":200,"ts":1542900000000,"userAgent":"UA","userId":"7"}"#;

/// Anonymous home page view
pub const HOME_LINE: &str = r#"{"artist":null,"auth":"Logged Out","firstName":null,"gender":null,"itemInSession":0,"lastName":null,"length":null,"level":"free","location":null,"method":"GET","page":"Home","registration":null,"sessionId":3,"song":null,"status":200,"ts":1542837400000,"userAgent":null,"userId":""}"#;

/// Logged-in user visiting settings
pub const SETTINGS_LINE: &str = r#"{"artist":null,"auth":"Logged In","firstName":"Kate","gender":"F","itemInSession":4,"lastName":"Harrell","length":null,"level":"paid","location":"Lansing-East Lansing, MI","method":"PUT","page":"Settings","registration":1540472624796.0,"sessionId":293,"song":null,"status":307,"ts":1542837408000,"userAgent":"UA","userId":97}"#;
