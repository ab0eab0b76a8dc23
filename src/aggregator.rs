//! Daily aggregation
//!
//! Collapses every source table onto one `daily_aggregates` row per calendar
//! date. Missing source data produces nulls, never errors, and every date in
//! the requested range gets a row even when nothing was recorded.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::{
  BodyCompositionSample, DailyAggregate, HeartRateSummary, MetricSample, SleepEpisode, StrengthSet,
};
use crate::reducers;
use crate::sources;
use crate::store;

/// ---------------------------------------------------------------------------
/// Unit Conversions
/// ---------------------------------------------------------------------------

/// Kilojoules to kilocalories
pub const KJ_TO_KCAL: f64 = 0.239006;
pub const METERS_PER_KILOMETER: f64 = 1000.0;
pub const MINUTES_PER_HOUR: f64 = 60.0;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AggregateError {
  #[error("Invalid argument: {0}")]
  InvalidArgument(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}

/// ---------------------------------------------------------------------------
/// Metric Catalogue
/// ---------------------------------------------------------------------------

/// Granular metrics the aggregator understands, keyed by source metric name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
  Steps,
  ExerciseMinutes,
  ActiveEnergy,
  RestingEnergy,
  StandMinutes,
  Distance,
  RestingHeartRate,
  HrvSdnn,
  Vo2Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rollup {
  Sum,
  Mean,
}

impl MetricKind {
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "step_count" => Some(MetricKind::Steps),
      "apple_exercise_time" => Some(MetricKind::ExerciseMinutes),
      "active_energy" => Some(MetricKind::ActiveEnergy),
      "basal_energy_burned" => Some(MetricKind::RestingEnergy),
      "apple_stand_time" => Some(MetricKind::StandMinutes),
      "walking_running_distance" | "distance_walking_running" => Some(MetricKind::Distance),
      "resting_heart_rate" => Some(MetricKind::RestingHeartRate),
      "heart_rate_variability" | "heart_rate_variability_sdnn" | "hrv_sdnn_ms" => {
        Some(MetricKind::HrvSdnn)
      }
      "vo2_max" | "vo2max" => Some(MetricKind::Vo2Max),
      _ => None,
    }
  }

  fn rollup(&self) -> Rollup {
    match self {
      MetricKind::RestingHeartRate | MetricKind::HrvSdnn | MetricKind::Vo2Max => Rollup::Mean,
      _ => Rollup::Sum,
    }
  }

  /// Convert a raw source value into the unit stored on the aggregate row
  pub fn normalize(&self, value: f64) -> f64 {
    match self {
      MetricKind::ActiveEnergy | MetricKind::RestingEnergy => value * KJ_TO_KCAL,
      MetricKind::Distance => value * METERS_PER_KILOMETER,
      _ => value,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Per-Date Collapse
/// ---------------------------------------------------------------------------

/// Every source row that landed on one date
#[derive(Debug, Default)]
pub struct DayBucket<'a> {
  pub body_composition: Option<&'a BodyCompositionSample>,
  pub metrics: Vec<&'a MetricSample>,
  pub heart_rate: Vec<&'a HeartRateSummary>,
  pub sleep: Vec<&'a SleepEpisode>,
  pub strength: Vec<&'a StrengthSet>,
}

impl<'a> DayBucket<'a> {
  fn metric(&self, kind: MetricKind) -> Option<f64> {
    let values = self
      .metrics
      .iter()
      .filter(|m| MetricKind::from_name(&m.metric) == Some(kind))
      .map(|m| Some(kind.normalize(m.value)));

    match kind.rollup() {
      Rollup::Sum => reducers::sum(values),
      Rollup::Mean => reducers::mean(values),
    }
  }

  /// Build the aggregate row for `date` from this bucket
  pub fn collapse(&self, date: NaiveDate) -> DailyAggregate {
    let body = self.body_composition;
    let sleep = reducers::longest_episode(&self.sleep);
    let hours_to_minutes = |hours: Option<f64>| hours.map(|h| h * MINUTES_PER_HOUR);

    DailyAggregate {
      date,

      weight_kg: body.and_then(|b| b.weight_kg),
      body_fat_pct: body.and_then(|b| b.body_fat_pct),
      muscle_pct: body.and_then(|b| b.muscle_pct),
      water_pct: body.and_then(|b| b.water_pct),

      steps: self.metric(MetricKind::Steps).map(|s| s.round() as i64),
      exercise_minutes: self.metric(MetricKind::ExerciseMinutes),
      active_calories: self.metric(MetricKind::ActiveEnergy),
      resting_calories: self.metric(MetricKind::RestingEnergy),
      stand_minutes: self.metric(MetricKind::StandMinutes),
      distance_m: self.metric(MetricKind::Distance),

      resting_hr: self.metric(MetricKind::RestingHeartRate),
      avg_hr: reducers::avg_of_avgs(&self.heart_rate),
      max_hr: reducers::max_of_maxes(&self.heart_rate),
      min_hr: reducers::min_of_mins(&self.heart_rate),
      hrv_sdnn_ms: self.metric(MetricKind::HrvSdnn),
      vo2_max_direct: self.metric(MetricKind::Vo2Max),

      total_sleep_minutes: sleep.map(|s| s.in_bed_minutes()),
      asleep_minutes: sleep.and_then(|s| hours_to_minutes(s.total_sleep_hrs)),
      rem_minutes: sleep.and_then(|s| hours_to_minutes(s.rem_hrs)),
      deep_minutes: sleep.and_then(|s| hours_to_minutes(s.deep_hrs)),
      core_minutes: sleep.and_then(|s| hours_to_minutes(s.core_hrs)),
      awake_minutes: sleep.and_then(|s| hours_to_minutes(s.awake_hrs)),

      strength_volume: reducers::strength_volume(&self.strength),

      body_age_years: None,
      body_age_delta_years: None,
    }
  }
}

/// Group source rows by date
pub fn bucket_by_date(rows: &sources::SourceRows) -> BTreeMap<NaiveDate, DayBucket<'_>> {
  let mut buckets: BTreeMap<NaiveDate, DayBucket<'_>> = BTreeMap::new();

  for sample in &rows.body_composition {
    buckets.entry(sample.date).or_default().body_composition = Some(sample);
  }
  for sample in &rows.metrics {
    buckets.entry(sample.date).or_default().metrics.push(sample);
  }
  for summary in &rows.heart_rate {
    buckets.entry(summary.date).or_default().heart_rate.push(summary);
  }
  for episode in &rows.sleep {
    buckets.entry(episode.date).or_default().sleep.push(episode);
  }
  for set in &rows.strength {
    buckets.entry(set.date).or_default().strength.push(set);
  }

  buckets
}

/// Every date from `start` to `end`, both inclusive
pub fn calendar_walk(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
  start.iter_days().take_while(move |d| *d <= end)
}

/// Build aggregate rows for each date in range, with placeholders for gaps
pub fn build_rows(rows: &sources::SourceRows, start: NaiveDate, end: NaiveDate) -> Vec<DailyAggregate> {
  let buckets = bucket_by_date(rows);

  calendar_walk(start, end)
    .map(|date| match buckets.get(&date) {
      Some(bucket) => bucket.collapse(date),
      None => DailyAggregate::empty(date),
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Entry Points
/// ---------------------------------------------------------------------------

/// Rebuild `daily_aggregates` for `[start, end]`. The whole range is written
/// in one transaction. Returns the number of rows written.
pub async fn aggregate(
  pool: &SqlitePool,
  start: NaiveDate,
  end: NaiveDate,
) -> Result<usize, AggregateError> {
  if start > end {
    return Err(AggregateError::InvalidArgument(format!(
      "start date {} is after end date {}",
      start, end
    )));
  }

  let source_rows = sources::load_range(pool, start, end).await?;
  let rows = build_rows(&source_rows, start, end);

  store::daily::replace_range(pool, &rows).await?;

  tracing::info!(%start, %end, rows = rows.len(), "Aggregated daily rows");
  Ok(rows.len())
}

/// Rebuild from the earliest date seen in any source through `today`
pub async fn aggregate_all(pool: &SqlitePool, today: NaiveDate) -> Result<usize, AggregateError> {
  let earliest = match sources::earliest_source_date(pool).await? {
    Some(date) => date,
    None => {
      tracing::info!("No source data yet, nothing to aggregate");
      return Ok(0);
    }
  };

  if earliest > today {
    tracing::warn!(%earliest, %today, "Earliest source date is in the future, skipping aggregation");
    return Ok(0);
  }

  aggregate(pool, earliest, today).await
}
