use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A scored body-age result for one date (`body_age_daily`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BodyAgeRecord {
  pub date: NaiveDate,
  pub input_window_days: i64,
  pub crf_score: f64,
  pub body_comp_score: f64,
  pub activity_score: f64,
  pub recovery_score: f64,
  pub composite_score: f64,
  pub body_age_years: f64,
  pub age_delta_years: f64,
  pub used_vo2max_direct: bool,
  pub cap_applied: bool,
  pub computed_at: DateTime<Utc>,
}
