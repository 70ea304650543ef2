use crate::models::{ModelRow, StoredVideoRow};
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Weekday};

/// Columns `video_sentiments.csv` must carry for model data to be built.
pub const REQUIRED_COLUMNS: [&str; 4] = ["title", "view_count", "upload_timestamp", "compound"];

/// Weekdays kept as indicator columns; Friday is the dropped reference.
pub const ONE_HOT_DAYS: [Weekday; 6] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Sat,
    Weekday::Sun,
];

/// The raw attributes features are derived from. Only `tags` may be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInput {
    pub title: String,
    pub tags: Option<String>,
    pub upload_timestamp: String,
    pub view_count: u64,
    pub compound: f64,
}

impl FeatureInput {
    /// `None` when any required cell is blank or unreadable.
    pub fn from_stored(row: &StoredVideoRow) -> Option<Self> {
        Some(Self {
            title: row.title.clone()?,
            tags: row.tags.clone(),
            upload_timestamp: row.upload_timestamp.clone()?,
            view_count: row.view_count?,
            compound: row.compound?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub view_count: u64,
    pub compound: f64,
    pub title_length: usize,
    pub tag_count: usize,
    pub publish_hour: u32,
    pub publish_day: Weekday,
}

impl FeatureRow {
    pub fn publish_day_name(&self) -> &'static str {
        weekday_name(self.publish_day)
    }

    pub fn day_flags(&self) -> [u8; 6] {
        ONE_HOT_DAYS.map(|day| u8::from(day == self.publish_day))
    }

    pub fn to_model_row(&self) -> ModelRow {
        let [monday, tuesday, wednesday, thursday, saturday, sunday] = self.day_flags();
        ModelRow {
            view_count: self.view_count,
            title_length: self.title_length,
            tag_count: self.tag_count,
            compound: self.compound,
            publish_hour: self.publish_hour,
            monday,
            tuesday,
            wednesday,
            thursday,
            saturday,
            sunday,
        }
    }
}

/// Derives model features from one video. `None` means the publish
/// timestamp could not be parsed and the row should be dropped.
pub fn derive_features(input: &FeatureInput) -> Option<FeatureRow> {
    let published = parse_timestamp(&input.upload_timestamp)?;
    Some(FeatureRow {
        view_count: input.view_count,
        compound: input.compound,
        title_length: input.title.chars().count(),
        tag_count: count_tags(input.tags.as_deref()),
        publish_hour: published.hour(),
        publish_day: published.weekday(),
    })
}

pub fn count_tags(tags: Option<&str>) -> usize {
    tags.map(|tags| tags.split('|').filter(|t| !t.trim().is_empty()).count())
        .unwrap_or(0)
}

/// Parses RFC 3339 timestamps in their own offset, or naive ISO-8601 ones.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.naive_local());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
