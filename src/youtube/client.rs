use crate::prelude::*;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use url::Url;

/// The four read operations the pipeline needs from the YouTube Data API.
/// Responses are handed back as raw JSON; shaping them is the caller's job.
#[async_trait]
pub trait YoutubeApi: Send + Sync {
    async fn channels(&self, channel_id: &str) -> Result<Value>;

    async fn search_recent(&self, channel_id: &str, max_results: u32) -> Result<Value>;

    async fn videos(&self, video_id: &str) -> Result<Value>;

    async fn comment_threads(
        &self,
        video_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<Value>;
}

/// Reason the API gives when a video's owner has turned comments off.
pub const COMMENTS_DISABLED: &str = "commentsDisabled";

/// A non-success answer from the API, keeping the machine-readable reasons
/// from `error.errors[].reason` so callers can tell expected refusals apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub resource: String,
    pub status: u16,
    pub message: String,
    pub reasons: Vec<String>,
}

impl ApiError {
    pub fn from_body(resource: &str, status: u16, body: &Value) -> Self {
        let reasons = body["error"]["errors"]
            .as_array()
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|error| error["reason"].as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        ApiError {
            resource: resource.to_string(),
            status,
            message: body["error"]["message"]
                .as_str()
                .unwrap_or("no error message")
                .to_string(),
            reasons,
        }
    }

    pub fn has_reason(&self, reason: &str) -> bool {
        self.reasons.iter().any(|r| r == reason)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} returned {}: {}", self.resource, self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Whether `err` is the API refusing to list comments because they are off.
pub fn is_comments_disabled(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(|e| e.has_reason(COMMENTS_DISABLED))
}

pub struct YoutubeClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl YoutubeClient {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid API base URL {}", base_url))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url,
        })
    }

    fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.join(resource)?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn get(&self, resource: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = self.endpoint(resource, params)?;
        // without_url keeps the key out of error messages and logs
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("request to {} failed", resource))?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or_default();
            let err = ApiError::from_body(resource, status.as_u16(), &body);
            if !err.has_reason(COMMENTS_DISABLED) {
                tracing::error!(
                    %status,
                    resource,
                    reason = %err.message,
                    "Non-success response from YouTube"
                );
            }
            return Err(err.into());
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("{} returned a body that is not JSON", resource))
    }
}

#[async_trait]
impl YoutubeApi for YoutubeClient {
    async fn channels(&self, channel_id: &str) -> Result<Value> {
        self.get(
            "channels",
            &[("part", "snippet,statistics"), ("id", channel_id)],
        )
        .await
    }

    async fn search_recent(&self, channel_id: &str, max_results: u32) -> Result<Value> {
        let max_results = max_results.to_string();
        self.get(
            "search",
            &[
                ("part", "snippet,id"),
                ("channelId", channel_id),
                ("order", "date"),
                ("type", "video"),
                ("maxResults", &max_results),
            ],
        )
        .await
    }

    async fn videos(&self, video_id: &str) -> Result<Value> {
        self.get("videos", &[("part", "snippet,statistics"), ("id", video_id)])
            .await
    }

    async fn comment_threads(
        &self,
        video_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<Value> {
        let max_results = max_results.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("maxResults", max_results.as_str()),
            ("textFormat", "plainText"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get("commentThreads", &params).await
    }
}

/// The API encodes counts as decimal strings; absent or hidden counts read as 0.
pub fn parse_count(value: &Value) -> u64 {
    match value {
        Value::String(s) => s.parse().unwrap_or(0),
        Value::Number(n) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_appends_params_and_key() {
        let client = YoutubeClient::new("secret", "https://example.test/youtube/v3").unwrap();
        let url = client
            .endpoint("channels", &[("part", "snippet"), ("id", "UC1")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/youtube/v3/channels?part=snippet&id=UC1&key=secret"
        );
    }

    #[test]
    fn endpoint_escapes_page_tokens() {
        let client = YoutubeClient::new("k", "https://example.test/v3/").unwrap();
        let url = client
            .endpoint("commentThreads", &[("pageToken", "a+b/c=")])
            .unwrap();
        assert_eq!(url.query(), Some("pageToken=a%2Bb%2Fc%3D&key=k"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(YoutubeClient::new("k", "not a url").is_err());
    }

    #[test]
    fn api_error_keeps_reasons_from_the_body() {
        let body = json!({
            "error": {
                "code": 403,
                "message": "The video identified by the videoId parameter has disabled comments.",
                "errors": [{ "domain": "youtube.commentThread", "reason": "commentsDisabled" }]
            }
        });
        let err = ApiError::from_body("commentThreads", 403, &body);
        assert!(err.has_reason(COMMENTS_DISABLED));
        assert!(is_comments_disabled(&anyhow::Error::new(err.clone())));
        assert!(err.to_string().starts_with("commentThreads returned 403"));
    }

    #[test]
    fn other_refusals_are_not_comments_disabled() {
        let body = json!({ "error": { "errors": [{ "reason": "quotaExceeded" }] } });
        let err = ApiError::from_body("videos", 403, &body);
        assert!(!is_comments_disabled(&anyhow::Error::new(err)));
        assert!(!is_comments_disabled(&anyhow::anyhow!("connection reset")));
        assert_eq!(ApiError::from_body("videos", 500, &json!(null)).message, "no error message");
    }

    #[test]
    fn counts_parse_from_strings_and_numbers() {
        assert_eq!(parse_count(&json!("1234")), 1234);
        assert_eq!(parse_count(&json!(56)), 56);
        assert_eq!(parse_count(&json!(null)), 0);
        assert_eq!(parse_count(&json!("n/a")), 0);
    }
}
