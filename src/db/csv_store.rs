use crate::models::{
    ChannelSnapshot, CommentScoreRow, ModelRow, StoredVideoRow, SubscriberObservation,
    VideoSentimentRow,
};
use crate::prelude::*;
use anyhow::{anyhow, Context};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

/// A flat CSV file with a fixed header row.
pub trait Table {
    const FILE_NAME: &'static str;
    /// Column names in struct field order.
    const HEADER: &'static [&'static str];
}

impl Table for ChannelSnapshot {
    const FILE_NAME: &'static str = "channel_stats.csv";
    const HEADER: &'static [&'static str] = &[
        "channel_id",
        "channel_name",
        "subscriber_count",
        "total_view_count",
        "total_video_count",
    ];
}

impl Table for VideoSentimentRow {
    const FILE_NAME: &'static str = "video_sentiments.csv";
    const HEADER: &'static [&'static str] = &[
        "video_id",
        "channel_id",
        "channel_name",
        "title",
        "upload_timestamp",
        "tags",
        "view_count",
        "like_count",
        "comment_count",
        "subscriber_count",
        "compound",
        "positive",
        "negative",
        "neutral",
        "total_comments",
        "title_length",
        "tag_count",
        "publish_hour",
        "publish_day",
    ];
}

impl Table for StoredVideoRow {
    const FILE_NAME: &'static str = VideoSentimentRow::FILE_NAME;
    const HEADER: &'static [&'static str] = VideoSentimentRow::HEADER;
}

impl Table for SubscriberObservation {
    const FILE_NAME: &'static str = "subs_timeseries.csv";
    const HEADER: &'static [&'static str] = &["date", "channel_name", "subscriber_count"];
}

impl Table for CommentScoreRow {
    const FILE_NAME: &'static str = "comment_sentiments.csv";
    const HEADER: &'static [&'static str] = &[
        "video_id",
        "channel_name",
        "title",
        "comment",
        "compound",
        "positive",
        "neutral",
        "negative",
    ];
}

impl Table for ModelRow {
    const FILE_NAME: &'static str = "model_data.csv";
    const HEADER: &'static [&'static str] = &[
        "view_count",
        "title_length",
        "tag_count",
        "compound",
        "publish_hour",
        "day_of_week_Monday",
        "day_of_week_Tuesday",
        "day_of_week_Wednesday",
        "day_of_week_Thursday",
        "day_of_week_Saturday",
        "day_of_week_Sunday",
    ];
}

/// Replaces `path` with a header row plus `rows`. The table is written to a
/// temporary file in the same directory and renamed over the target, so
/// readers see either the old file or the new one.
pub fn write_table<T: Table + Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(temp.as_file_mut());
        writer.write_record(T::HEADER)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;

    tracing::info!(path = %path.display(), rows = rows.len(), "wrote table");
    Ok(())
}

/// Loads every row of `path`, first checking the header carries `required`.
pub fn read_table<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h.trim() == *column))
        .collect();
    if !missing.is_empty() {
        let err = format!("{} is missing columns {:?}", path.display(), missing);
        tracing::error!(err);
        return Err(anyhow!(err));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize().enumerate() {
        let row: T = record.with_context(|| {
            format!("{}: malformed data row {}", path.display(), index + 1)
        })?;
        rows.push(row);
    }

    Ok(rows)
}
