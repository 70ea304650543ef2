use crate::db::csv_store::{read_table, write_table, Table};
use crate::db::timeseries::append_observation;
use crate::feature::{derive_features, FeatureInput, REQUIRED_COLUMNS};
use crate::models::{
    ChannelSnapshot, CommentScoreRow, CommentSentiment, ModelRow, RecentVideo, StoredVideoRow,
    SubscriberObservation, VideoDetails, VideoSentimentRow,
};
use crate::prelude::*;
use crate::sentiment::{score_comments, PolarityScorer, PolarityScores};
use crate::service::var_service::Config;
use crate::youtube::channel::fetch_channel;
use crate::youtube::comment::collect_comments;
use crate::youtube::video::{fetch_video_details, list_recent_videos};
use crate::youtube::YoutubeApi;
use anyhow::anyhow;
use chrono::NaiveDate;
use itertools::Itertools;
use rayon::prelude::*;

/// Snapshots every configured channel, scores the comments of its recent
/// videos and writes `channel_stats.csv` and `video_sentiments.csv`. Each
/// snapshot is also appended to the subscriber log.
///
/// A channel or video that cannot be fetched is logged and skipped. When no
/// configured channel could be fetched at all the step fails and the tables
/// from the previous run are left in place.
pub async fn run_fetch(
    config: &Config,
    api: &impl YoutubeApi,
    scorer: &impl PolarityScorer,
    today: NaiveDate,
) -> Result<()> {
    let mut snapshots = Vec::new();
    let mut rows = Vec::new();

    for channel_id in &config.channel_ids {
        let Some(snapshot) = snapshot_channel(config, api, channel_id, today).await else {
            continue;
        };

        match fetch_channel_videos(config, api, scorer, &snapshot).await {
            Ok(channel_rows) => rows.extend(channel_rows),
            Err(e) => tracing::error!(%channel_id, "Failed to list recent videos: {:#}", e),
        }
        snapshots.push(snapshot);
    }

    if snapshots.is_empty() && !config.channel_ids.is_empty() {
        let err = format!(
            "None of the {} configured channels could be fetched, keeping previous tables",
            config.channel_ids.len()
        );
        tracing::error!(err);
        return Err(anyhow!(err));
    }

    write_table(&config.data_path(ChannelSnapshot::FILE_NAME), &snapshots)?;
    write_table(&config.data_path(VideoSentimentRow::FILE_NAME), &rows)?;
    tracing::info!(
        channels = snapshots.len(),
        videos = rows.len(),
        aggregation = %config.aggregation,
        "fetch finished"
    );

    Ok(())
}

/// Appends today's subscriber count of every configured channel to the
/// subscriber log without touching any video. Returns the channels recorded.
pub async fn run_subscriber_tracking(
    config: &Config,
    api: &impl YoutubeApi,
    today: NaiveDate,
) -> Result<usize> {
    let mut recorded = 0;
    for channel_id in &config.channel_ids {
        if snapshot_channel(config, api, channel_id, today).await.is_some() {
            recorded += 1;
        }
    }

    tracing::info!(recorded, "subscriber tracking finished");
    Ok(recorded)
}

async fn snapshot_channel(
    config: &Config,
    api: &impl YoutubeApi,
    channel_id: &str,
    today: NaiveDate,
) -> Option<ChannelSnapshot> {
    let snapshot = match fetch_channel(api, channel_id).await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            tracing::warn!(channel_id, "No channel found, skipping");
            return None;
        }
        Err(e) => {
            tracing::error!(channel_id, "Failed to fetch channel: {:#}", e);
            return None;
        }
    };

    let log_path = config.data_path(SubscriberObservation::FILE_NAME);
    if let Err(e) = append_observation(
        &log_path,
        &snapshot.channel_name,
        today,
        snapshot.subscriber_count,
    ) {
        tracing::error!(channel_id, "Failed to append subscriber observation: {:#}", e);
    }

    Some(snapshot)
}

async fn fetch_channel_videos(
    config: &Config,
    api: &impl YoutubeApi,
    scorer: &impl PolarityScorer,
    snapshot: &ChannelSnapshot,
) -> Result<Vec<VideoSentimentRow>> {
    let videos = list_recent_videos(api, &snapshot.channel_id, config.recent_videos).await?;
    if videos.is_empty() {
        tracing::warn!(channel_id = %snapshot.channel_id, "No recent videos found");
    }

    let mut rows = Vec::new();

    for video in videos {
        let video_id = video.video_id.as_str();
        let details = match fetch_video_details(api, video_id).await {
            Ok(Some(details)) => details,
            Ok(None) => {
                tracing::warn!(video_id, "No video details found, skipping");
                continue;
            }
            Err(e) => {
                tracing::error!(video_id, "Failed to fetch video details: {:#}", e);
                continue;
            }
        };

        let comments = match collect_comments(
            api,
            video_id,
            config.max_comments,
            config.comment_page_delay,
        )
        .await
        {
            Ok(comments) => comments,
            Err(e) => {
                tracing::error!(video_id, "Failed to collect comments: {:#}", e);
                continue;
            }
        };

        let sentiment = score_comments(scorer, &comments, config.aggregation);
        match build_video_row(snapshot, &video, &details, sentiment) {
            Some(row) => rows.push(row),
            None => tracing::warn!(
                video_id,
                published_at = %video.published_at,
                "Unparseable publish time, dropping video"
            ),
        }
    }

    Ok(rows)
}

fn build_video_row(
    snapshot: &ChannelSnapshot,
    video: &RecentVideo,
    details: &VideoDetails,
    sentiment: CommentSentiment,
) -> Option<VideoSentimentRow> {
    let tags = details.tags.iter().join("|");
    let features = derive_features(&FeatureInput {
        title: video.title.clone(),
        tags: Some(tags.clone()),
        upload_timestamp: video.published_at.clone(),
        view_count: details.view_count,
        compound: sentiment.compound,
    })?;

    Some(VideoSentimentRow {
        video_id: video.video_id.clone(),
        channel_id: snapshot.channel_id.clone(),
        channel_name: snapshot.channel_name.clone(),
        title: video.title.clone(),
        upload_timestamp: video.published_at.clone(),
        tags,
        view_count: details.view_count,
        like_count: details.like_count,
        comment_count: details.comment_count,
        subscriber_count: snapshot.subscriber_count,
        compound: sentiment.compound,
        positive: sentiment.positive,
        negative: sentiment.negative,
        neutral: sentiment.neutral,
        total_comments: sentiment.total_comments,
        title_length: features.title_length,
        tag_count: features.tag_count,
        publish_hour: features.publish_hour,
        publish_day: features.publish_day_name().to_string(),
    })
}

/// Scores every comment of the videos listed in `video_sentiments.csv` on
/// its own and writes `comment_sentiments.csv`. Returns the rows written.
pub async fn run_comment_export(
    config: &Config,
    api: &impl YoutubeApi,
    scorer: &impl PolarityScorer,
) -> Result<usize> {
    let videos: Vec<StoredVideoRow> = read_table(
        &config.data_path(StoredVideoRow::FILE_NAME),
        &["video_id", "title"],
    )?;

    let mut rows = Vec::new();
    for video in videos {
        let Some(video_id) = video.video_id.as_deref() else {
            tracing::warn!("Video row without an id, skipping");
            continue;
        };

        let comments = match collect_comments(
            api,
            video_id,
            config.max_comments,
            config.comment_page_delay,
        )
        .await
        {
            Ok(comments) => comments,
            Err(e) => {
                tracing::error!(video_id, "Failed to collect comments: {:#}", e);
                continue;
            }
        };

        let scores: Vec<PolarityScores> = comments
            .par_iter()
            .map(|comment| scorer.polarity_scores(comment))
            .collect();

        let channel_name = video.channel_name.clone().unwrap_or_default();
        let title = video.title.clone().unwrap_or_default();
        rows.extend(comments.into_iter().zip(scores).map(|(comment, score)| {
            CommentScoreRow {
                video_id: video_id.to_string(),
                channel_name: channel_name.clone(),
                title: title.clone(),
                comment,
                compound: score.compound,
                positive: score.positive,
                neutral: score.neutral,
                negative: score.negative,
            }
        }));
    }

    write_table(&config.data_path(CommentScoreRow::FILE_NAME), &rows)?;
    tracing::info!(comments = rows.len(), "comment export finished");
    Ok(rows.len())
}

/// Builds the numeric feature matrix `model_data.csv` from
/// `video_sentiments.csv`. Rows missing a required value or carrying an
/// unparseable timestamp are dropped. Returns the rows written.
pub fn run_feature_export(config: &Config) -> Result<usize> {
    let videos: Vec<StoredVideoRow> =
        read_table(&config.data_path(StoredVideoRow::FILE_NAME), &REQUIRED_COLUMNS)?;

    let mut rows: Vec<ModelRow> = Vec::new();
    for (index, video) in videos.iter().enumerate() {
        let video_id = video.video_id.as_deref().unwrap_or("?");
        let Some(input) = FeatureInput::from_stored(video) else {
            tracing::warn!(row = index + 1, video_id, "Missing required value, dropping row");
            continue;
        };

        match derive_features(&input) {
            Some(features) => rows.push(features.to_model_row()),
            None => tracing::warn!(
                row = index + 1,
                video_id,
                upload_timestamp = %input.upload_timestamp,
                "Unparseable upload timestamp, dropping row"
            ),
        }
    }

    write_table(&config.data_path(ModelRow::FILE_NAME), &rows)?;
    tracing::info!(
        rows = rows.len(),
        dropped = videos.len() - rows.len(),
        "feature export finished"
    );
    Ok(rows.len())
}

/// `fetch`, then `comments`, then `features`.
pub async fn run_all(
    config: &Config,
    api: &impl YoutubeApi,
    scorer: &impl PolarityScorer,
    today: NaiveDate,
) -> Result<()> {
    run_fetch(config, api, scorer, today).await?;
    run_comment_export(config, api, scorer).await?;
    run_feature_export(config)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::aggregate::tests::FixedScorer;
    use crate::sentiment::Aggregation;
    use crate::service::var_service::DEFAULT_API_BASE_URL;
    use crate::youtube::fake::ScriptedApi;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(dir: &Path, channel_ids: &[&str]) -> Config {
        Config {
            api_key: "test-key".to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            channel_ids: channel_ids.iter().map(|id| id.to_string()).collect(),
            max_comments: 100,
            recent_videos: 5,
            comment_page_delay: Duration::ZERO,
            aggregation: Aggregation::Mean,
            data_dir: dir.to_path_buf(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn records(path: &Path) -> Vec<HashMap<String, String>> {
        csv::Reader::from_path(path)
            .unwrap()
            .deserialize()
            .map(|record| record.unwrap())
            .collect()
    }

    fn scorer() -> FixedScorer {
        FixedScorer::new(&[("good", 0.5), ("bad", -0.2), ("meh", 0.0)])
    }

    #[tokio::test]
    async fn fetch_builds_joined_video_rows() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &["UC1"]);
        let api = ScriptedApi::default()
            .with_channel("UC1", "Test Channel", 1000)
            .with_search("UC1", &[("v1", "Test", "2024-01-01T14:30:00")])
            .with_video("v1", 500, &["a", "b", "c"])
            .with_comments("v1", &["good", "bad", "meh"]);

        run_fetch(&config, &api, &scorer(), today()).await.unwrap();

        let videos = records(&dir.path().join(VideoSentimentRow::FILE_NAME));
        assert_eq!(videos.len(), 1);
        let video = &videos[0];
        assert_eq!(video["channel_name"], "Test Channel");
        assert_eq!(video["subscriber_count"], "1000");
        assert_eq!(video["tags"], "a|b|c");
        assert_eq!(video["view_count"], "500");
        assert_eq!(video["total_comments"], "3");
        assert_eq!(video["title_length"], "4");
        assert_eq!(video["tag_count"], "3");
        assert_eq!(video["publish_hour"], "14");
        assert_eq!(video["publish_day"], "Monday");
        let compound: f64 = video["compound"].parse().unwrap();
        assert!((compound - 0.1).abs() < 1e-9);

        let channels = records(&dir.path().join(ChannelSnapshot::FILE_NAME));
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0]["total_video_count"], "12");

        let log = records(&dir.path().join(SubscriberObservation::FILE_NAME));
        assert_eq!(log.len(), 1);
        assert_eq!(log[0]["date"], "2024-01-10");
        assert_eq!(log[0]["subscriber_count"], "1000");
    }

    #[tokio::test]
    async fn fetch_isolates_failing_channels_and_videos() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &["UC1", "UC2", "UC3"]);
        let api = ScriptedApi::default()
            .with_channel("UC1", "Ok", 10)
            .with_channel("UC2", "Broken", 20)
            .failing_on("UC2")
            .with_search(
                "UC1",
                &[
                    ("v1", "Kept", "2024-01-02T10:00:00Z"),
                    ("v2", "Details fail", "2024-01-02T10:00:00Z"),
                    ("v3", "Comments fail", "2024-01-02T10:00:00Z"),
                    ("v4", "Gone", "2024-01-02T10:00:00Z"),
                    ("v5", "Bad time", "someday"),
                ],
            )
            .with_video("v1", 1, &[])
            .with_video("v2", 1, &[])
            .failing_on("v2")
            .with_video("v3", 1, &[])
            .failing_on("comments:v3")
            .with_video("v5", 1, &[])
            .with_comments("v1", &["good"]);

        run_fetch(&config, &api, &scorer(), today()).await.unwrap();

        let videos = records(&dir.path().join(VideoSentimentRow::FILE_NAME));
        let ids: Vec<&str> = videos.iter().map(|v| v["video_id"].as_str()).collect();
        assert_eq!(ids, vec!["v1"]);
        assert_eq!(videos[0]["tag_count"], "0");

        let channels = records(&dir.path().join(ChannelSnapshot::FILE_NAME));
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0]["channel_id"], "UC1");
        assert_eq!(records(&dir.path().join(SubscriberObservation::FILE_NAME)).len(), 1);
    }

    #[tokio::test]
    async fn video_with_comments_disabled_is_kept_as_neutral() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &["UC1"]);
        let api = ScriptedApi::default()
            .with_channel("UC1", "Chan", 1)
            .with_search("UC1", &[("v1", "Closed", "2024-01-02T10:00:00Z")])
            .with_video("v1", 3, &[])
            .with_comments_disabled("v1");

        run_fetch(&config, &api, &scorer(), today()).await.unwrap();

        let videos = records(&dir.path().join(VideoSentimentRow::FILE_NAME));
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0]["video_id"], "v1");
        assert_eq!(videos[0]["total_comments"], "0");
        assert_eq!(videos[0]["neutral"].parse::<f64>().unwrap(), 1.0);

        assert_eq!(run_comment_export(&config, &api, &scorer()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fetch_keeps_previous_tables_when_every_channel_fails() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &["UC1", "UC2"]);
        let stats = dir.path().join(ChannelSnapshot::FILE_NAME);
        let videos = dir.path().join(VideoSentimentRow::FILE_NAME);
        let previous_stats = "channel_id,channel_name,subscriber_count,total_view_count,\
                              total_video_count\nUC1,Chan,1,2,3\n";
        let previous_videos = "video_id,title\nv1,Earlier\n";
        fs::write(&stats, previous_stats).unwrap();
        fs::write(&videos, previous_videos).unwrap();
        let api = ScriptedApi::default()
            .with_channel("UC1", "Chan", 1)
            .failing_on("UC1");

        assert!(run_fetch(&config, &api, &scorer(), today()).await.is_err());
        assert!(run_all(&config, &api, &scorer(), today()).await.is_err());

        assert_eq!(fs::read_to_string(&stats).unwrap(), previous_stats);
        assert_eq!(fs::read_to_string(&videos).unwrap(), previous_videos);
        assert!(!dir.path().join(ModelRow::FILE_NAME).exists());
    }

    #[tokio::test]
    async fn video_without_comments_gets_neutral_sentiment() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &["UC1"]);
        let api = ScriptedApi::default()
            .with_channel("UC1", "Quiet", 1)
            .with_search("UC1", &[("v1", "Silence", "2024-01-02T10:00:00Z")])
            .with_video("v1", 1, &["x"]);

        run_fetch(&config, &api, &scorer(), today()).await.unwrap();

        let videos = records(&dir.path().join(VideoSentimentRow::FILE_NAME));
        assert_eq!(videos[0]["total_comments"], "0");
        assert_eq!(videos[0]["neutral"].parse::<f64>().unwrap(), 1.0);
    }

    #[tokio::test]
    async fn tracking_twice_on_one_day_keeps_both_rows() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &["UC1", "UCmissing"]);
        let api = ScriptedApi::default().with_channel("UC1", "Tracked", 42);

        assert_eq!(run_subscriber_tracking(&config, &api, today()).await.unwrap(), 1);
        assert_eq!(run_subscriber_tracking(&config, &api, today()).await.unwrap(), 1);

        let log = records(&dir.path().join(SubscriberObservation::FILE_NAME));
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|row| row["channel_name"] == "Tracked"));
        assert!(!dir.path().join(VideoSentimentRow::FILE_NAME).exists());
    }

    #[tokio::test]
    async fn comment_export_scores_each_comment_in_order() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &[]);
        fs::write(
            dir.path().join(StoredVideoRow::FILE_NAME),
            "video_id,channel_name,title\nv1,Chan,First\nv2,Chan,Broken\n",
        )
        .unwrap();
        let api = ScriptedApi::default()
            .with_comments("v1", &["good", "bad", "meh"])
            .with_comments("v2", &["good"])
            .failing_on("comments:v2");

        assert_eq!(run_comment_export(&config, &api, &scorer()).await.unwrap(), 3);

        let rows: Vec<CommentScoreRow> =
            read_table(&dir.path().join(CommentScoreRow::FILE_NAME), CommentScoreRow::HEADER)
                .unwrap();
        let comments: Vec<&str> = rows.iter().map(|r| r.comment.as_str()).collect();
        assert_eq!(comments, vec!["good", "bad", "meh"]);
        assert_eq!(rows[1].compound, -0.2);
        assert_eq!(rows[0].title, "First");
    }

    #[tokio::test]
    async fn comment_export_requires_video_ids() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &[]);
        fs::write(dir.path().join(StoredVideoRow::FILE_NAME), "title\nx\n").unwrap();
        let api = ScriptedApi::default();

        assert!(run_comment_export(&config, &api, &scorer()).await.is_err());
        assert!(!dir.path().join(CommentScoreRow::FILE_NAME).exists());
    }

    #[test]
    fn feature_export_drops_incomplete_rows() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &[]);
        fs::write(
            dir.path().join(StoredVideoRow::FILE_NAME),
            "video_id,title,tags,view_count,upload_timestamp,compound\n\
             v1,Friday show,a|b,100,2024-01-05T20:00:00Z,0.3\n\
             v2,No score,,100,2024-01-05T20:00:00Z,\n\
             v3,Bad time,,100,not a time,0.1\n\
             v4,Monday show,,7,2024-01-01 09:00:00,-0.5\n",
        )
        .unwrap();

        assert_eq!(run_feature_export(&config).unwrap(), 2);

        let rows: Vec<ModelRow> =
            read_table(&dir.path().join(ModelRow::FILE_NAME), ModelRow::HEADER).unwrap();
        assert_eq!(rows[0].tag_count, 2);
        assert_eq!(rows[0].publish_hour, 20);
        let friday_flags = rows[0].monday
            + rows[0].tuesday
            + rows[0].wednesday
            + rows[0].thursday
            + rows[0].saturday
            + rows[0].sunday;
        assert_eq!(friday_flags, 0);
        assert_eq!(rows[1].monday, 1);
        assert_eq!(rows[1].view_count, 7);
        assert_eq!(rows[1].tag_count, 0);
    }

    #[test]
    fn feature_export_names_missing_columns() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &[]);
        fs::write(
            dir.path().join(StoredVideoRow::FILE_NAME),
            "video_id,title,view_count\nv1,t,1\n",
        )
        .unwrap();

        let err = run_feature_export(&config).unwrap_err().to_string();
        assert!(err.contains("upload_timestamp"), "{}", err);
        assert!(err.contains("compound"), "{}", err);
        assert!(!dir.path().join(ModelRow::FILE_NAME).exists());
    }

    #[tokio::test]
    async fn all_runs_every_export() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &["UC1"]);
        let api = ScriptedApi::default()
            .with_channel("UC1", "Chan", 5)
            .with_search("UC1", &[("v1", "Test", "2024-01-01T14:30:00")])
            .with_video("v1", 9, &["a"])
            .with_comments("v1", &["good", "bad"]);

        run_all(&config, &api, &scorer(), today()).await.unwrap();

        assert_eq!(records(&dir.path().join(CommentScoreRow::FILE_NAME)).len(), 2);
        let model = records(&dir.path().join(ModelRow::FILE_NAME));
        assert_eq!(model.len(), 1);
        assert_eq!(model[0]["day_of_week_Monday"], "1");
        assert_eq!(model[0]["title_length"], "4");
    }
}
