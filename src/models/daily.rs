use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of `daily_aggregates`: every source collapsed onto a calendar date.
///
/// All metric columns are nullable because not every source reports every
/// day. `strength_volume` is the exception and defaults to zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyAggregate {
  pub date: NaiveDate,

  // Body composition
  pub weight_kg: Option<f64>,
  pub body_fat_pct: Option<f64>,
  pub muscle_pct: Option<f64>,
  pub water_pct: Option<f64>,

  // Activity
  pub steps: Option<i64>,
  pub exercise_minutes: Option<f64>,
  pub active_calories: Option<f64>,
  pub resting_calories: Option<f64>,
  pub stand_minutes: Option<f64>,
  pub distance_m: Option<f64>,

  // Heart / fitness
  pub resting_hr: Option<f64>,
  pub avg_hr: Option<f64>,
  pub max_hr: Option<i64>,
  pub min_hr: Option<i64>,
  pub hrv_sdnn_ms: Option<f64>,
  pub vo2_max_direct: Option<f64>,

  // Sleep (minutes)
  pub total_sleep_minutes: Option<f64>,
  pub asleep_minutes: Option<f64>,
  pub rem_minutes: Option<f64>,
  pub deep_minutes: Option<f64>,
  pub core_minutes: Option<f64>,
  pub awake_minutes: Option<f64>,

  /// Sum of weight x reps over every strength set logged that day
  pub strength_volume: f64,

  // Written back by the scorer
  pub body_age_years: Option<f64>,
  pub body_age_delta_years: Option<f64>,
}

impl DailyAggregate {
  /// An all-null placeholder row for a date with no source data
  pub fn empty(date: NaiveDate) -> Self {
    Self {
      date,
      ..Default::default()
    }
  }
}
