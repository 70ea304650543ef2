use crate::prelude::*;
use crate::sentiment::Aggregation;
use anyhow::anyhow;
use std::{env::var, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// Everything a run needs, resolved once at startup and passed to each step.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: String,
    pub channel_ids: Vec<String>,
    pub max_comments: usize,
    pub recent_videos: u32,
    pub comment_page_delay: Duration,
    pub aggregation: Aggregation,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            api_key: get_youtube_api_key()?,
            api_base_url: get_api_base_url(),
            channel_ids: get_youtube_channel_ids(),
            max_comments: get_max_comments()?,
            recent_videos: get_recent_videos()?,
            comment_page_delay: Duration::from_millis(get_comment_page_delay_ms()?),
            aggregation: get_aggregation()?,
            data_dir: get_data_dir(),
        })
    }

    pub fn data_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }
}

/// Channels tracked when `YOUTUBE_CHANNEL_IDS` is unset.
pub fn default_channel_ids() -> Vec<String> {
    vec![
        "UCJZ7f6NQzGKZnFXzFW9y9UQ".to_string(),
        "UCYO_jab_esuFRV4b17AJtAw".to_string(),
        "UC8butISFwT-Wl7EV0hUK0BQ".to_string(),
    ]
}

pub fn get_youtube_api_key() -> Result<String> {
    match var("YOUTUBE_API_KEY") {
        Ok(api_key) => match api_key.trim().is_empty() {
            true => {
                let err = "YOUTUBE_API_KEY is empty";
                tracing::error!(err);
                Err(anyhow!(err))
            }
            false => Ok(api_key.trim().to_string()),
        },
        Err(e) => {
            let err = format!("YOUTUBE_API_KEY not found in environment: {}", e);
            tracing::error!(err);
            Err(anyhow!(err))
        }
    }
}

pub fn get_youtube_channel_ids() -> Vec<String> {
    match var("YOUTUBE_CHANNEL_IDS") {
        Ok(channel_ids) => {
            let channel_ids = parse_channel_ids(&channel_ids);
            if channel_ids.is_empty() {
                tracing::info!("YOUTUBE_CHANNEL_IDS is empty, using default channels");
                return default_channel_ids();
            }
            channel_ids
        }
        Err(_) => default_channel_ids(),
    }
}

pub fn get_api_base_url() -> String {
    match var("YOUTUBE_API_BASE_URL") {
        Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
        _ => DEFAULT_API_BASE_URL.to_string(),
    }
}

pub fn get_max_comments() -> Result<usize> {
    parse_var("MAX_COMMENTS", 100)
}

pub fn get_recent_videos() -> Result<u32> {
    let recent_videos: u32 = parse_var("RECENT_VIDEOS", 5)?;
    if !(1..=50).contains(&recent_videos) {
        tracing::warn!(recent_videos, "RECENT_VIDEOS outside 1..=50, clamping");
    }
    Ok(recent_videos.clamp(1, 50))
}

pub fn get_comment_page_delay_ms() -> Result<u64> {
    parse_var("COMMENT_PAGE_DELAY_MS", 200)
}

pub fn get_aggregation() -> Result<Aggregation> {
    parse_var("SENTIMENT_AGGREGATION", Aggregation::Mean)
}

pub fn get_data_dir() -> PathBuf {
    match var("DATA_DIR") {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
        _ => PathBuf::from("."),
    }
}

pub fn parse_channel_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|&s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match var(name) {
        Ok(value) if value.trim().is_empty() => Ok(default),
        Ok(value) => match value.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(e) => {
                let err = format!("Failed to parse {}={:?}: {}", name, value, e);
                tracing::error!(err);
                Err(anyhow!(err))
            }
        },
        Err(_) => Ok(default),
    }
}
