//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Source row factories
//! - A seeded scoring window
//! - Helper assertions

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;

use crate::models::{
  BodyAgeRecord, BodyCompositionSample, HeartRateSummary, MetricSample, SleepEpisode, StrengthSet,
};
use crate::sources;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Seed seven days ending at `target` with the reference profile:
/// 18% body fat, 10,000 steps, 25 exercise minutes, resting HR 58 and
/// 7 hours asleep each day, no HRV and no direct VO2max.
pub async fn seed_test_window(pool: &SqlitePool, target: NaiveDate) {
  for offset in 0..7 {
    let day = target - Duration::days(offset);

    sources::save_body_composition(pool, &body_composition(day, Some(80.0), Some(18.0)))
      .await
      .expect("Failed to seed body composition");

    for (name, value) in [
      ("step_count", 10000.0),
      ("apple_exercise_time", 25.0),
      ("resting_heart_rate", 58.0),
    ] {
      sources::save_metric_sample(pool, &metric(day, "Watch", name, value))
        .await
        .expect("Failed to seed metric");
    }

    sources::save_sleep_episode(pool, &sleep_episode(day, "Watch", 23, 7.0))
      .await
      .expect("Failed to seed sleep");
  }
}

/// ---------------------------------------------------------------------------
/// Source Row Factories
/// ---------------------------------------------------------------------------

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, month, day).expect("Invalid test date")
}

pub fn metric(day: NaiveDate, device: &str, name: &str, value: f64) -> MetricSample {
  MetricSample {
    date: day,
    device: device.to_string(),
    metric: name.to_string(),
    value,
  }
}

pub fn body_composition(
  day: NaiveDate,
  weight_kg: Option<f64>,
  body_fat_pct: Option<f64>,
) -> BodyCompositionSample {
  BodyCompositionSample {
    date: day,
    weight_kg,
    body_fat_pct,
    muscle_pct: None,
    water_pct: None,
  }
}

pub fn heart_rate(day: NaiveDate, device: &str, min: i64, avg: f64, max: i64) -> HeartRateSummary {
  HeartRateSummary {
    date: day,
    device: device.to_string(),
    hr_min: Some(min),
    hr_avg: Some(avg),
    hr_max: Some(max),
  }
}

/// A sleep episode starting at `start_hour` UTC on the evening before `day`.
/// Time in bed runs 15 minutes either side of the sleep span.
pub fn sleep_episode(day: NaiveDate, device: &str, start_hour: u32, asleep_hrs: f64) -> SleepEpisode {
  let evening = day - Duration::days(1);
  let sleep_start = Utc
    .from_utc_datetime(&evening.and_hms_opt(start_hour, 0, 0).expect("Invalid start hour"));
  let sleep_end = sleep_start + Duration::minutes((asleep_hrs * 60.0).round() as i64);

  SleepEpisode {
    date: day,
    device: device.to_string(),
    sleep_start,
    sleep_end,
    in_bed_start: Some(sleep_start - Duration::minutes(15)),
    in_bed_end: Some(sleep_end + Duration::minutes(15)),
    total_sleep_hrs: Some(asleep_hrs),
    core_hrs: Some(asleep_hrs * 0.5),
    deep_hrs: Some(asleep_hrs * 0.2),
    rem_hrs: Some(asleep_hrs * 0.3),
    awake_hrs: Some(0.25),
  }
}

pub fn strength_set(
  day: NaiveDate,
  exercise_id: i64,
  set_number: i64,
  weight_kg: Option<f64>,
  reps: Option<i64>,
) -> StrengthSet {
  StrengthSet {
    date: day,
    exercise_id,
    set_number,
    reps,
    weight_kg,
    rir: Some(2.0),
  }
}

/// A stored body-age record with a fixed `computed_at`
pub fn mock_body_age_record(day: NaiveDate, body_age_years: f64) -> BodyAgeRecord {
  BodyAgeRecord {
    date: day,
    input_window_days: 7,
    crf_score: 48.6,
    body_comp_score: 80.0,
    activity_score: 83.3,
    recovery_score: 85.3,
    composite_score: 68.9,
    body_age_years,
    age_delta_years: -3.8,
    used_vo2max_direct: false,
    cap_applied: false,
    computed_at: Utc
      .with_ymd_and_hms(2024, 1, 16, 6, 0, 0)
      .single()
      .expect("Invalid fixed timestamp"),
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('daily_aggregates', 'body_age_daily', 'metric_samples', 'sleep_episodes')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 4, "Expected 4 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_window_covers_seven_days() {
    let pool = setup_test_db().await;

    seed_test_window(&pool, date(2024, 1, 15)).await;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT date) FROM metric_samples")
      .fetch_one(&pool)
      .await
      .expect("Failed to count dates");
    assert_eq!(count, 7);

    let earliest = sources::earliest_source_date(&pool).await.unwrap();
    assert_eq!(earliest, Some(date(2024, 1, 9)));

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_sleep_episode_factory() {
    let episode = sleep_episode(date(2024, 1, 15), "Watch", 22, 7.5);
    assert_eq!(episode.sleep_start.date_naive(), date(2024, 1, 14));
    assert_eq!((episode.sleep_end - episode.sleep_start).num_minutes(), 450);
    assert_eq!(episode.in_bed_minutes(), 480.0);
  }
}
