use super::csv_store::{read_table, write_table, Table};
use crate::models::SubscriberObservation;
use crate::prelude::*;
use chrono::NaiveDate;
use std::path::Path;

/// Adds one subscriber observation to the log at `log_path`, creating it if
/// absent, and returns the number of data rows now in the log.
///
/// The whole log is read, extended and rewritten in one replace. Rows are
/// never deduplicated: appending the same channel twice on one date leaves
/// two rows.
pub fn append_observation(
    log_path: &Path,
    channel_name: &str,
    date: NaiveDate,
    subscriber_count: u64,
) -> Result<usize> {
    let mut observations: Vec<SubscriberObservation> = match log_path.exists() {
        true => read_table(log_path, SubscriberObservation::HEADER)?,
        false => {
            tracing::info!(path = %log_path.display(), "creating subscriber log");
            Vec::new()
        }
    };

    observations.push(SubscriberObservation {
        date,
        channel_name: channel_name.to_string(),
        subscriber_count,
    });
    write_table(log_path, &observations)?;

    tracing::info!(channel_name, %date, subscriber_count, "appended subscriber observation");
    Ok(observations.len())
}
