use super::client::{ApiError, YoutubeApi, COMMENTS_DISABLED};
use crate::prelude::*;
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// In-memory stand-in for the YouTube API with canned responses.
#[derive(Default)]
pub struct ScriptedApi {
    pub channels: HashMap<String, Value>,
    pub searches: HashMap<String, Value>,
    pub videos: HashMap<String, Value>,
    /// Keyed by (video_id, page_token); the first page has no token.
    pub comment_pages: HashMap<(String, Option<String>), Value>,
    pub failing: HashSet<String>,
    pub comments_disabled: HashSet<String>,
    pub comment_requests: Mutex<Vec<(String, u32, Option<String>)>>,
}

impl ScriptedApi {
    pub fn with_channel(mut self, channel_id: &str, name: &str, subscribers: u64) -> Self {
        self.channels.insert(
            channel_id.to_string(),
            json!({
                "items": [{
                    "id": channel_id,
                    "snippet": { "title": name },
                    "statistics": {
                        "subscriberCount": subscribers.to_string(),
                        "viewCount": "5000",
                        "videoCount": "12"
                    }
                }]
            }),
        );
        self
    }

    pub fn with_search(mut self, channel_id: &str, videos: &[(&str, &str, &str)]) -> Self {
        let items: Vec<Value> = videos
            .iter()
            .map(|(id, title, published_at)| {
                json!({
                    "id": { "kind": "youtube#video", "videoId": id },
                    "snippet": { "title": title, "publishedAt": published_at }
                })
            })
            .collect();
        self.searches
            .insert(channel_id.to_string(), json!({ "items": items }));
        self
    }

    pub fn with_video(mut self, video_id: &str, views: u64, tags: &[&str]) -> Self {
        self.videos.insert(
            video_id.to_string(),
            json!({
                "items": [{
                    "id": video_id,
                    "snippet": { "tags": tags },
                    "statistics": {
                        "viewCount": views.to_string(),
                        "likeCount": "10",
                        "commentCount": "3"
                    }
                }]
            }),
        );
        self
    }

    /// Splits `comments` into pages of `page_sizes`, chained by tokens.
    pub fn with_comment_pages(mut self, video_id: &str, page_sizes: &[usize]) -> Self {
        let mut token: Option<String> = None;
        let mut n = 0;
        for (index, size) in page_sizes.iter().enumerate() {
            let items: Vec<Value> = (0..*size)
                .map(|_| {
                    n += 1;
                    comment_item(&format!("comment {}", n))
                })
                .collect();
            let next = (index + 1 < page_sizes.len()).then(|| format!("page-{}", index + 1));
            let mut page = json!({ "items": items });
            if let Some(next) = &next {
                page["nextPageToken"] = json!(next);
            }
            self.comment_pages
                .insert((video_id.to_string(), token.clone()), page);
            token = next;
        }
        self
    }

    pub fn with_comments(mut self, video_id: &str, comments: &[&str]) -> Self {
        let items: Vec<Value> = comments.iter().map(|c| comment_item(c)).collect();
        self.comment_pages
            .insert((video_id.to_string(), None), json!({ "items": items }));
        self
    }

    /// Answers commentThreads for `video_id` the way the API does when the
    /// owner has turned comments off.
    pub fn with_comments_disabled(mut self, video_id: &str) -> Self {
        self.comments_disabled.insert(video_id.to_string());
        self
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    fn check(&self, id: &str) -> Result<()> {
        match self.failing.contains(id) {
            true => Err(anyhow!("scripted failure for {}", id)),
            false => Ok(()),
        }
    }
}

pub fn comment_item(text: &str) -> Value {
    json!({
        "snippet": {
            "topLevelComment": {
                "snippet": { "textDisplay": text }
            }
        }
    })
}

#[async_trait]
impl YoutubeApi for ScriptedApi {
    async fn channels(&self, channel_id: &str) -> Result<Value> {
        self.check(channel_id)?;
        Ok(self
            .channels
            .get(channel_id)
            .cloned()
            .unwrap_or_else(|| json!({ "items": [] })))
    }

    async fn search_recent(&self, channel_id: &str, _max_results: u32) -> Result<Value> {
        Ok(self
            .searches
            .get(channel_id)
            .cloned()
            .unwrap_or_else(|| json!({ "items": [] })))
    }

    async fn videos(&self, video_id: &str) -> Result<Value> {
        self.check(video_id)?;
        Ok(self
            .videos
            .get(video_id)
            .cloned()
            .unwrap_or_else(|| json!({ "items": [] })))
    }

    async fn comment_threads(
        &self,
        video_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<Value> {
        if let Ok(mut requests) = self.comment_requests.lock() {
            requests.push((
                video_id.to_string(),
                max_results,
                page_token.map(str::to_string),
            ));
        }
        self.check(&format!("comments:{}", video_id))?;
        if self.comments_disabled.contains(video_id) {
            let body = json!({
                "error": {
                    "code": 403,
                    "message": "The video has disabled comments.",
                    "errors": [{ "reason": COMMENTS_DISABLED }]
                }
            });
            return Err(ApiError::from_body("commentThreads", 403, &body).into());
        }
        Ok(self
            .comment_pages
            .get(&(video_id.to_string(), page_token.map(str::to_string)))
            .cloned()
            .unwrap_or_else(|| json!({ "items": [] })))
    }
}
