mod prelude;
mod models;
mod feature;
mod db {
    pub mod csv_store;
    pub mod timeseries;
}
mod sentiment {
    pub mod aggregate;
    pub mod clean;
    pub mod lexicon;

    pub use aggregate::{score_comments, Aggregation, PolarityScorer, PolarityScores};
}
mod service {
    pub mod log_service;
    pub mod pipeline_service;
    pub mod var_service;
}
mod youtube {
    pub mod channel;
    pub mod client;
    pub mod comment;
    #[cfg(test)]
    pub mod fake;
    pub mod video;

    pub use client::{YoutubeApi, YoutubeClient};
}

use chrono::Local;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use prelude::*;
use sentiment::lexicon::LexiconScorer;
use service::log_service::setup_logging;
use service::pipeline_service::{
    run_all, run_comment_export, run_feature_export, run_fetch, run_subscriber_tracking,
};
use service::var_service::Config;
use std::path::PathBuf;
use youtube::YoutubeClient;

#[derive(Debug, Parser)]
#[command(name = "tubepulse")]
#[command(about = "YouTube channel statistics and comment sentiment collector")]
struct Cli {
    /// Directory the CSV tables are read from and written to. Overrides DATA_DIR.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Comments collected per video. Overrides MAX_COMMENTS.
    #[arg(long)]
    max_comments: Option<usize>,

    /// Recent videos listed per channel (1-50). Overrides RECENT_VIDEOS.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=50))]
    recent_videos: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Snapshot channels and score recent videos into video_sentiments.csv
    Fetch,
    /// Score individual comments of the fetched videos into comment_sentiments.csv
    Comments,
    /// Build model_data.csv from video_sentiments.csv
    Features,
    /// Append today's subscriber counts to subs_timeseries.csv
    TrackSubscribers,
    /// Fetch, comments and features in order
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let _guard = setup_logging()?;
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(max_comments) = cli.max_comments {
        config.max_comments = max_comments;
    }
    if let Some(recent_videos) = cli.recent_videos {
        config.recent_videos = recent_videos;
    }

    let api = YoutubeClient::new(&config.api_key, &config.api_base_url)?;
    let scorer = LexiconScorer::new()?;
    let today = Local::now().date_naive();
    tracing::info!(
        command = ?cli.command,
        channels = config.channel_ids.len(),
        data_dir = %config.data_dir.display(),
        "starting"
    );

    match cli.command {
        Command::Fetch => run_fetch(&config, &api, &scorer, today).await?,
        Command::Comments => {
            run_comment_export(&config, &api, &scorer).await?;
        }
        Command::Features => {
            run_feature_export(&config)?;
        }
        Command::TrackSubscribers => {
            run_subscriber_tracking(&config, &api, today).await?;
        }
        Command::All => run_all(&config, &api, &scorer, today).await?,
    }

    Ok(())
}
