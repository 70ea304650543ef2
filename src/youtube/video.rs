use super::client::{parse_count, YoutubeApi};
use crate::models::{RecentVideo, VideoDetails};
use crate::prelude::*;
use serde_json::Value;

/// The `max_results` most recently published videos of a channel, newest first.
pub async fn list_recent_videos(
    api: &impl YoutubeApi,
    channel_id: &str,
    max_results: u32,
) -> Result<Vec<RecentVideo>> {
    let response = api.search_recent(channel_id, max_results).await?;
    Ok(parse_search(&response))
}

fn parse_search(response: &Value) -> Vec<RecentVideo> {
    let mut videos = Vec::new();
    let Some(items) = response["items"].as_array() else {
        return videos;
    };

    for item in items {
        if item["id"]["kind"].as_str() != Some("youtube#video") {
            continue;
        }

        let Some(video_id) = item["id"]["videoId"].as_str() else {
            continue;
        };

        let Some(snippet) = item["snippet"].as_object() else {
            continue;
        };

        let title = match snippet.get("title").and_then(Value::as_str) {
            Some(title) => title.to_string(),
            None => continue,
        };

        let published_at = match snippet.get("publishedAt").and_then(Value::as_str) {
            Some(published_at) => published_at.to_string(),
            None => continue,
        };

        videos.push(RecentVideo {
            video_id: video_id.to_string(),
            title,
            published_at,
        });
    }

    videos
}

/// Engagement counts and tags for one video, or `None` if the video is gone.
pub async fn fetch_video_details(
    api: &impl YoutubeApi,
    video_id: &str,
) -> Result<Option<VideoDetails>> {
    let response = api.videos(video_id).await?;
    Ok(parse_video(&response))
}

fn parse_video(response: &Value) -> Option<VideoDetails> {
    let video = response["items"].as_array()?.first()?;
    let statistics = &video["statistics"];
    let tags = video["snippet"]["tags"]
        .as_array()
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(VideoDetails {
        view_count: parse_count(&statistics["viewCount"]),
        like_count: parse_count(&statistics["likeCount"]),
        comment_count: parse_count(&statistics["commentCount"]),
        tags,
    })
}
