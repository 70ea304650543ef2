use super::client::{parse_count, YoutubeApi};
use crate::models::ChannelSnapshot;
use crate::prelude::*;
use serde_json::Value;

/// Current statistics for a channel, or `None` when the API knows no such channel.
pub async fn fetch_channel(
    api: &impl YoutubeApi,
    channel_id: &str,
) -> Result<Option<ChannelSnapshot>> {
    let response = api.channels(channel_id).await?;
    Ok(parse_channel(channel_id, &response))
}

fn parse_channel(channel_id: &str, response: &Value) -> Option<ChannelSnapshot> {
    let channel = response["items"].as_array()?.first()?;
    let Some(channel_name) = channel["snippet"]["title"].as_str() else {
        tracing::warn!(channel_id, "Channel response has no title");
        return None;
    };

    let statistics = &channel["statistics"];
    Some(ChannelSnapshot {
        channel_id: channel_id.to_string(),
        channel_name: channel_name.to_string(),
        subscriber_count: parse_count(&statistics["subscriberCount"]),
        total_view_count: parse_count(&statistics["viewCount"]),
        total_video_count: parse_count(&statistics["videoCount"]),
    })
}
