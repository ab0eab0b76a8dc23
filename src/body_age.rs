//! Body-age scorer
//!
//! Reads the trailing window from `daily_aggregates`, scores it with
//! [`crate::scoring`] and persists the result to `body_age_daily`, mirroring
//! the headline numbers back onto the target date's aggregate row.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::aggregator::calendar_walk;
use crate::models::BodyAgeRecord;
use crate::scoring::{self, BodyAgeScore, WindowAverages, INPUT_WINDOW_DAYS};
use crate::store;

/// Days between the two records compared by [`body_age_trend`]
pub const TREND_LOOKBACK_DAYS: i64 = 7;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum BodyAgeError {
  #[error("Invalid argument: {0}")]
  InvalidArgument(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}

fn required(value: Option<NaiveDate>, name: &str) -> Result<NaiveDate, BodyAgeError> {
  value.ok_or_else(|| BodyAgeError::InvalidArgument(format!("{} is required", name)))
}

/// ---------------------------------------------------------------------------
/// Scoring
/// ---------------------------------------------------------------------------

/// Score `target` against the 7 days ending on it.
///
/// Returns `Ok(None)` without writing anything when the window holds no
/// aggregate rows. Otherwise the record is upserted and the stored copy is
/// returned; re-running with unchanged inputs leaves the stored row as is.
pub async fn compute(
  pool: &SqlitePool,
  target: Option<NaiveDate>,
  birth: Option<NaiveDate>,
) -> Result<Option<BodyAgeRecord>, BodyAgeError> {
  let target = required(target, "target_date")?;
  let birth = required(birth, "birth_date")?;

  if birth > target {
    return Err(BodyAgeError::InvalidArgument(format!(
      "birth date {} is after target date {}",
      birth, target
    )));
  }

  let window_start = target - Duration::days(INPUT_WINDOW_DAYS - 1);
  let rows = store::daily::load_range(pool, window_start, target).await?;

  if rows.is_empty() {
    tracing::info!(%target, "No aggregate rows in window, skipping body age");
    return Ok(None);
  }

  let averages = WindowAverages::from_rows(&rows);
  let chrono_years = scoring::chronological_age(target, birth);
  let score = BodyAgeScore::compute(&averages, chrono_years);
  let record = score.to_record(target, Utc::now());

  if record.cap_applied {
    tracing::info!(%target, composite = record.composite_score, "Body age improvement capped");
  }

  let mut tx = pool.begin().await?;
  let written = store::body_age::upsert_record(&mut *tx, &record).await?;
  store::daily::write_body_age(&mut *tx, target, record.body_age_years, record.age_delta_years)
    .await?;
  tx.commit().await?;

  tracing::debug!(
    %target,
    crf = record.crf_score,
    body_comp = record.body_comp_score,
    activity = record.activity_score,
    recovery = record.recovery_score,
    composite = record.composite_score,
    body_age = record.body_age_years,
    delta = record.age_delta_years,
    written,
    "Scored body age"
  );

  Ok(store::body_age::load_record(pool, target).await?)
}

/// Outcome of scoring a date range
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeOutcome {
  pub scored: Vec<BodyAgeRecord>,
  pub skipped: Vec<NaiveDate>,
}

/// Run [`compute`] for every date in `[start, end]`, oldest first
pub async fn compute_range(
  pool: &SqlitePool,
  start: Option<NaiveDate>,
  end: Option<NaiveDate>,
  birth: Option<NaiveDate>,
) -> Result<RangeOutcome, BodyAgeError> {
  let start = required(start, "start_date")?;
  let end = required(end, "end_date")?;
  let birth = required(birth, "birth_date")?;

  if start > end {
    return Err(BodyAgeError::InvalidArgument(format!(
      "start date {} is after end date {}",
      start, end
    )));
  }

  let mut outcome = RangeOutcome::default();
  for date in calendar_walk(start, end) {
    match compute(pool, Some(date), Some(birth)).await? {
      Some(record) => outcome.scored.push(record),
      None => outcome.skipped.push(date),
    }
  }

  tracing::info!(
    %start,
    %end,
    scored = outcome.scored.len(),
    skipped = outcome.skipped.len(),
    "Scored body age range"
  );
  Ok(outcome)
}

/// ---------------------------------------------------------------------------
/// Trend
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyAgeTrend {
  pub sample_date: NaiveDate,
  pub value: f64,
  /// Change against the record exactly a week before `sample_date`
  pub delta: Option<f64>,
}

/// Latest body age on or before `target`, with its week-over-week change
pub async fn body_age_trend(
  pool: &SqlitePool,
  target: NaiveDate,
) -> Result<Option<BodyAgeTrend>, BodyAgeError> {
  let latest = match store::body_age::latest_on_or_before(pool, target).await? {
    Some(record) => record,
    None => return Ok(None),
  };

  let previous_date = latest.date - Duration::days(TREND_LOOKBACK_DAYS);
  let previous = store::body_age::load_record(pool, previous_date).await?;

  Ok(Some(BodyAgeTrend {
    sample_date: latest.date,
    value: latest.body_age_years,
    delta: previous.map(|p| scoring::round1(latest.body_age_years - p.body_age_years)),
  }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::aggregator;
  use crate::models::DailyAggregate;
  use crate::test_utils::*;

  #[tokio::test]
  async fn test_compute_requires_both_dates() {
    let pool = setup_test_db().await;

    let missing_target = compute(&pool, None, Some(date(1990, 1, 1))).await;
    assert!(matches!(missing_target, Err(BodyAgeError::InvalidArgument(_))));

    let missing_birth = compute(&pool, Some(date(2024, 1, 15)), None).await;
    assert!(matches!(missing_birth, Err(BodyAgeError::InvalidArgument(_))));

    let inverted = compute(&pool, Some(date(1989, 1, 1)), Some(date(1990, 1, 1))).await;
    assert!(matches!(inverted, Err(BodyAgeError::InvalidArgument(_))));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_compute_skips_empty_window() {
    let pool = setup_test_db().await;
    store::daily::replace_range(&pool, &[DailyAggregate::empty(date(2024, 1, 1))])
      .await
      .unwrap();

    let result = compute(&pool, Some(date(2024, 1, 15)), Some(date(1990, 1, 1)))
      .await
      .unwrap();
    assert!(result.is_none());

    let stored = store::body_age::load_record(&pool, date(2024, 1, 15)).await.unwrap();
    assert!(stored.is_none());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_compute_end_to_end_golden() {
    let pool = setup_test_db().await;
    let target = date(2024, 1, 15);
    seed_test_window(&pool, target).await;
    aggregator::aggregate(&pool, date(2024, 1, 9), target).await.unwrap();

    let record = compute(&pool, Some(target), Some(date(1990, 1, 1)))
      .await
      .unwrap()
      .unwrap();

    assert_eq!(record.crf_score, 48.6);
    assert_eq!(record.body_comp_score, 80.0);
    assert_eq!(record.activity_score, 83.3);
    assert_eq!(record.recovery_score, 85.3);
    assert_eq!(record.composite_score, 68.9);
    assert_eq!(record.body_age_years, 30.3);
    assert_eq!(record.age_delta_years, -3.8);
    assert!(!record.used_vo2max_direct);
    assert!(!record.cap_applied);

    let daily = store::daily::load_range(&pool, target, target).await.unwrap();
    assert_eq!(daily[0].body_age_years, Some(30.3));
    assert_eq!(daily[0].body_age_delta_years, Some(-3.8));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_compute_range_is_idempotent() {
    let pool = setup_test_db().await;
    let (start, end) = (date(2024, 1, 9), date(2024, 1, 15));
    seed_test_window(&pool, end).await;
    aggregator::aggregate(&pool, start, end).await.unwrap();
    let birth = Some(date(1990, 1, 1));

    let first = compute_range(&pool, Some(start), Some(end), birth).await.unwrap();
    let stored_first = store::body_age::load_range(&pool, start, end).await.unwrap();

    let second = compute_range(&pool, Some(start), Some(end), birth).await.unwrap();
    let stored_second = store::body_age::load_range(&pool, start, end).await.unwrap();

    assert_eq!(first.scored.len(), 7);
    assert!(first.skipped.is_empty());
    assert_eq!(first, second);
    assert_eq!(stored_first, stored_second);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_compute_range_reports_skipped_dates() {
    let pool = setup_test_db().await;
    store::daily::replace_range(&pool, &[DailyAggregate::empty(date(2024, 1, 4))])
      .await
      .unwrap();

    let outcome = compute_range(
      &pool,
      Some(date(2024, 1, 1)),
      Some(date(2024, 1, 10)),
      Some(date(1990, 1, 1)),
    )
    .await
    .unwrap();

    assert_eq!(outcome.scored.len(), 7);
    assert_eq!(outcome.skipped, vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_compute_range_rejects_inverted_range() {
    let pool = setup_test_db().await;

    let result = compute_range(
      &pool,
      Some(date(2024, 1, 15)),
      Some(date(2024, 1, 14)),
      Some(date(1990, 1, 1)),
    )
    .await;
    assert!(matches!(result, Err(BodyAgeError::InvalidArgument(_))));

    let missing = compute_range(&pool, None, Some(date(2024, 1, 14)), Some(date(1990, 1, 1))).await;
    assert!(matches!(missing, Err(BodyAgeError::InvalidArgument(_))));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_body_age_trend_week_over_week() {
    let pool = setup_test_db().await;

    let mut conn = pool.acquire().await.unwrap();
    for (day, age) in [(date(2024, 1, 8), 31.0), (date(2024, 1, 15), 30.3)] {
      store::body_age::upsert_record(&mut *conn, &mock_body_age_record(day, age))
        .await
        .unwrap();
    }
    drop(conn);

    let trend = body_age_trend(&pool, date(2024, 1, 16)).await.unwrap().unwrap();
    assert_eq!(trend.sample_date, date(2024, 1, 15));
    assert_eq!(trend.value, 30.3);
    assert_eq!(trend.delta, Some(-0.7));

    let first_week = body_age_trend(&pool, date(2024, 1, 10)).await.unwrap().unwrap();
    assert_eq!(first_week.sample_date, date(2024, 1, 8));
    assert_eq!(first_week.delta, None);

    assert!(body_age_trend(&pool, date(2024, 1, 1)).await.unwrap().is_none());

    teardown_test_db(pool).await;
  }
}
