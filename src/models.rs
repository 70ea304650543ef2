use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub channel_id: String,
    pub channel_name: String,
    pub subscriber_count: u64,
    pub total_view_count: u64,
    pub total_video_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentVideo {
    pub video_id: String,
    pub title: String,
    pub published_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoDetails {
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub tags: Vec<String>,
}

/// Aggregate polarity of a video's comments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommentSentiment {
    pub compound: f64,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    pub total_comments: usize,
}

impl CommentSentiment {
    /// Returned when there is nothing to score.
    pub const NEUTRAL: CommentSentiment = CommentSentiment {
        compound: 0.0,
        positive: 0.0,
        negative: 0.0,
        neutral: 1.0,
        total_comments: 0,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberObservation {
    pub date: NaiveDate,
    pub channel_name: String,
    pub subscriber_count: u64,
}

/// One row of `video_sentiments.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSentimentRow {
    pub video_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub title: String,
    pub upload_timestamp: String,
    pub tags: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub subscriber_count: u64,
    pub compound: f64,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    pub total_comments: usize,
    pub title_length: usize,
    pub tag_count: usize,
    pub publish_hour: u32,
    pub publish_day: String,
}

/// A `video_sentiments.csv` row as read back from disk. Every cell may be
/// blank or garbled, so nothing is trusted until feature derivation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StoredVideoRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub video_id: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub channel_name: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub upload_timestamp: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub compound: Option<f64>,
}

/// One row of `comment_sentiments.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentScoreRow {
    pub video_id: String,
    pub channel_name: String,
    pub title: String,
    pub comment: String,
    pub compound: f64,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

/// One row of `model_data.csv`. Friday is the dropped reference day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRow {
    pub view_count: u64,
    pub title_length: usize,
    pub tag_count: usize,
    pub compound: f64,
    pub publish_hour: u32,
    #[serde(rename = "day_of_week_Monday")]
    pub monday: u8,
    #[serde(rename = "day_of_week_Tuesday")]
    pub tuesday: u8,
    #[serde(rename = "day_of_week_Wednesday")]
    pub wednesday: u8,
    #[serde(rename = "day_of_week_Thursday")]
    pub thursday: u8,
    #[serde(rename = "day_of_week_Saturday")]
    pub saturday: u8,
    #[serde(rename = "day_of_week_Sunday")]
    pub sunday: u8,
}
