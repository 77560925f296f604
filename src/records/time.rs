use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

/// Storage format of `start_time`: UTC with millisecond precision.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Calendar decomposition of a play's start time, in UTC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeParts {
    pub start_time: NaiveDateTime,
    pub hour: u32,
    /// Day of month.
    pub day: u32,
    /// ISO-8601 week number.
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// 0 = Monday .. 6 = Sunday.
    pub weekday: u32,
}

impl TimeParts {
    /// `None` when `millis` is outside the representable range.
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        let start_time = DateTime::from_timestamp_millis(millis)?.naive_utc();
        Some(Self {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: start_time.weekday().num_days_from_monday(),
        })
    }

    pub fn start_time_text(&self) -> String {
        self.start_time.format(START_TIME_FORMAT).to_string()
    }
}
