//! Rows delivered by the upstream ingestion connectors.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Scale reading; at most one per date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BodyCompositionSample {
  pub date: NaiveDate,
  pub weight_kg: Option<f64>,
  pub body_fat_pct: Option<f64>,
  pub muscle_pct: Option<f64>,
  pub water_pct: Option<f64>,
}

/// A named daily metric value reported by one device, in source units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MetricSample {
  pub date: NaiveDate,
  pub device: String,
  pub metric: String,
  pub value: f64,
}

/// Daily heart-rate summary from one recording device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HeartRateSummary {
  pub date: NaiveDate,
  pub device: String,
  pub hr_min: Option<i64>,
  pub hr_avg: Option<f64>,
  pub hr_max: Option<i64>,
}

/// One sleep episode; phase durations are in hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SleepEpisode {
  pub date: NaiveDate,
  pub device: String,
  pub sleep_start: DateTime<Utc>,
  pub sleep_end: DateTime<Utc>,
  pub in_bed_start: Option<DateTime<Utc>>,
  pub in_bed_end: Option<DateTime<Utc>>,
  pub total_sleep_hrs: Option<f64>,
  pub core_hrs: Option<f64>,
  pub deep_hrs: Option<f64>,
  pub rem_hrs: Option<f64>,
  pub awake_hrs: Option<f64>,
}

impl SleepEpisode {
  /// Time in bed in minutes, falling back to the sleep span
  pub fn in_bed_minutes(&self) -> f64 {
    let (start, end) = match (self.in_bed_start, self.in_bed_end) {
      (Some(start), Some(end)) => (start, end),
      _ => (self.sleep_start, self.sleep_end),
    };
    (end - start).num_seconds() as f64 / 60.0
  }
}

/// A logged strength set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StrengthSet {
  pub date: NaiveDate,
  pub exercise_id: i64,
  pub set_number: i64,
  pub reps: Option<i64>,
  pub weight_kg: Option<f64>,
  pub rir: Option<f64>,
}
