//! One refresh pass: rebuild the daily rollup, then rescore the trailing days.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::aggregator::{self, AggregateError};
use crate::body_age::{self, BodyAgeError, BodyAgeTrend};
use crate::config::{ConfigError, Settings};
use crate::models::BodyAgeRecord;

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Configuration error: {0}")]
  Config(#[from] ConfigError),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Aggregation failed: {0}")]
  Aggregate(#[from] AggregateError),

  #[error("Body age scoring failed: {0}")]
  BodyAge(#[from] BodyAgeError),

  #[error("Refresh window of {0} days does not fit before {1}")]
  InvalidRefreshWindow(i64, NaiveDate),
}

/// First date of the `refresh_days` window ending on `today`
fn refresh_start(today: NaiveDate, refresh_days: i64) -> Result<NaiveDate, PipelineError> {
  u64::try_from(refresh_days - 1)
    .ok()
    .and_then(|back| today.checked_sub_days(Days::new(back)))
    .ok_or(PipelineError::InvalidRefreshWindow(refresh_days, today))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
  pub rows_aggregated: usize,
  pub dates_scored: usize,
  pub dates_skipped: Vec<NaiveDate>,
  pub latest: Option<BodyAgeRecord>,
  pub trend: Option<BodyAgeTrend>,
}

/// Aggregate everything through `today`, then score the last
/// `settings.refresh_days` dates ending on `today`.
pub async fn refresh(
  pool: &SqlitePool,
  settings: &Settings,
  today: NaiveDate,
) -> Result<RefreshSummary, PipelineError> {
  let start = refresh_start(today, settings.refresh_days)?;
  let rows_aggregated = aggregator::aggregate_all(pool, today).await?;

  let outcome = body_age::compute_range(pool, Some(start), Some(today), settings.birth_date).await?;
  let trend = body_age::body_age_trend(pool, today).await?;

  let summary = RefreshSummary {
    rows_aggregated,
    dates_scored: outcome.scored.len(),
    dates_skipped: outcome.skipped,
    latest: outcome.scored.into_iter().last(),
    trend,
  };

  match serde_json::to_string(&summary) {
    Ok(json) => tracing::info!(summary = %json, "Refresh complete"),
    Err(e) => tracing::warn!("Refresh complete, summary not serializable: {}", e),
  }

  Ok(summary)
}
