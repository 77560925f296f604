use super::TimeParts;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Page value marking a completed song playback.
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// One activity-log record, as emitted by the app's event stream.
///
/// Only `NextSong` records are loaded; the others (page views, logins, ...)
/// may lack most fields, so everything is optional at this level.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub artist: Option<String>,
    pub auth: Option<String>,
    pub first_name: Option<String>,
    pub gender: Option<String>,
    pub item_in_session: Option<i64>,
    pub last_name: Option<String>,
    pub length: Option<f64>,
    pub level: Option<String>,
    pub location: Option<String>,
    pub method: Option<String>,
    pub page: Option<String>,
    pub registration: Option<f64>,
    pub session_id: Option<i64>,
    pub song: Option<String>,
    pub status: Option<i64>,
    pub ts: Option<i64>,
    pub user_agent: Option<String>,
    // Logged-out events carry an empty string
    #[serde(default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<String>,
}

fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(
            n.as_i64()
                .map(|i| i.to_string())
                .unwrap_or_else(|| n.to_string()),
        ),
        _ => None,
    })
}

/// A validated song play, ready to be split into time, user and songplay rows.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayEvent {
    pub time: TimeParts,
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: String,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl LogRecord {
    pub fn is_song_play(&self) -> bool {
        self.page.as_deref() == Some(NEXT_SONG_PAGE)
    }

    /// Converts a retained record, naming the first required field that is missing.
    pub fn into_play_event(self) -> Result<PlayEvent, String> {
        let ts = self.ts.ok_or("missing field `ts`")?;
        let time = TimeParts::from_epoch_millis(ts)
            .ok_or_else(|| format!("timestamp {} is out of range", ts))?;
        let user_id = self.user_id.ok_or("missing field `userId`")?;
        let level = self.level.ok_or("missing field `level`")?;
        let session_id = self.session_id.ok_or("missing field `sessionId`")?;

        Ok(PlayEvent {
            time,
            user_id,
            first_name: self.first_name,
            last_name: self.last_name,
            gender: self.gender,
            level,
            song: self.song,
            artist: self.artist,
            length: self.length,
            session_id,
            location: self.location,
            user_agent: self.user_agent,
        })
    }
}
