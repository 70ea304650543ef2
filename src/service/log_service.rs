use crate::prelude::*;
use sentry::{release_name, ClientInitGuard, ClientOptions};
use sentry_tracing::EventFilter;
use std::env::{var, VarError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. Errors go to Sentry when `SENTRY_DSN` is
/// set; the returned guard must live until the process exits so queued
/// events are flushed.
pub fn setup_logging() -> Result<Option<ClientInitGuard>> {
    let dsn = sentry_dsn(var("SENTRY_DSN"));
    let guard = dsn.as_ref().ok().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            ClientOptions {
                release: release_name!(),
                ..Default::default()
            },
        ))
    });

    let sentry_layer = guard.as_ref().map(|_| {
        sentry_tracing::layer().event_filter(|md| match *md.level() {
            tracing::Level::ERROR => EventFilter::Event,
            _ => EventFilter::Ignore,
        })
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(sentry_layer)
        .try_init()?;

    if let Err(reason) = dsn {
        tracing::info!("{}", reason);
    }

    Ok(guard)
}

/// The Sentry DSN to report to, or why there is none.
fn sentry_dsn(
    value: std::result::Result<String, VarError>,
) -> std::result::Result<String, &'static str> {
    match value {
        Ok(dsn) => match dsn.trim().is_empty() {
            true => Err("SENTRY_DSN is empty"),
            false => Ok(dsn.trim().to_string()),
        },
        Err(_) => Err("SENTRY_DSN not found in environment"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_missing_dsn_are_reported_differently() {
        assert_eq!(sentry_dsn(Ok(String::new())), Err("SENTRY_DSN is empty"));
        assert_eq!(sentry_dsn(Ok("  ".to_string())), Err("SENTRY_DSN is empty"));
        assert_eq!(
            sentry_dsn(Err(VarError::NotPresent)),
            Err("SENTRY_DSN not found in environment")
        );
    }

    #[test]
    fn dsn_is_trimmed() {
        assert_eq!(
            sentry_dsn(Ok(" https://key@sentry.example/1 \n".to_string())),
            Ok("https://key@sentry.example/1".to_string())
        );
    }
}
