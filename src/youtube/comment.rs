use super::client::{is_comments_disabled, YoutubeApi};
use crate::prelude::*;
use anyhow::anyhow;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

/// Largest page the commentThreads endpoint will return.
pub const COMMENT_PAGE_SIZE: usize = 100;

/// Top-level comments of a video in API order, at most `max_comments` of them.
///
/// Pages are followed through `nextPageToken` with a fixed `page_delay`
/// between requests. A video with comments turned off yields an empty list.
/// Any other failed request, or a page that does not look like a
/// commentThreads response, fails the whole collection.
pub async fn collect_comments(
    api: &impl YoutubeApi,
    video_id: &str,
    max_comments: usize,
    page_delay: Duration,
) -> Result<Vec<String>> {
    let mut comments = Vec::new();
    let mut next_page_token: Option<String> = None;

    while comments.len() < max_comments {
        let page_size = COMMENT_PAGE_SIZE.min(max_comments - comments.len());
        let response = match api
            .comment_threads(video_id, page_size as u32, next_page_token.as_deref())
            .await
        {
            Ok(response) => response,
            Err(e) if is_comments_disabled(&e) => {
                tracing::info!(video_id, "Comments are disabled");
                break;
            }
            Err(e) => return Err(e),
        };

        let page = parse_comment_page(&response)
            .map_err(|e| anyhow!("malformed commentThreads page for {}: {}", video_id, e))?;
        let remaining = max_comments - comments.len();
        comments.extend(page.into_iter().take(remaining));

        match response["nextPageToken"].as_str() {
            Some(token) if comments.len() < max_comments => {
                next_page_token = Some(token.to_string());
                sleep(page_delay).await;
            }
            _ => break,
        }
    }

    tracing::debug!(video_id, count = comments.len(), "collected comments");
    Ok(comments)
}

fn parse_comment_page(response: &Value) -> std::result::Result<Vec<String>, String> {
    let items = response["items"]
        .as_array()
        .ok_or_else(|| "no items array".to_string())?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item["snippet"]["topLevelComment"]["snippet"]["textDisplay"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("item {} has no textDisplay", index))
        })
        .collect()
}
