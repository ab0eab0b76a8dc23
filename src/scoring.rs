//! Body-age scoring
//!
//! Pure computation from 7-day window averages to a composite score and a
//! body-age estimate. Persistence lives in `body_age`; nothing here touches
//! the database.
//!
//! Composite = 40% cardiorespiratory fitness + 25% body composition
//!           + 20% activity + 15% recovery, each sub-score on 0-100 with 50
//!           as neutral. Every 5 composite points above 50 take one year off
//!           chronological age, capped at a 10-year improvement.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BodyAgeRecord, DailyAggregate};
use crate::reducers;

/// ---------------------------------------------------------------------------
/// Constants
/// ---------------------------------------------------------------------------

/// Trailing window length, inclusive of the target date
pub const INPUT_WINDOW_DAYS: i64 = 7;

/// Mean Gregorian year
pub const DAYS_PER_YEAR: f64 = 365.2425;

const CRF_WEIGHT: f64 = 0.40;
const BODY_COMP_WEIGHT: f64 = 0.25;
const ACTIVITY_WEIGHT: f64 = 0.20;
const RECOVERY_WEIGHT: f64 = 0.15;

const NEUTRAL_SCORE: f64 = 50.0;

// VO2max (ml/kg/min) mapped linearly onto 0-100 between these bounds
const VO2_FLOOR: f64 = 20.0;
const VO2_CEILING: f64 = 60.0;
const VO2_NEUTRAL_DEFAULT: f64 = 35.0;

const BODY_FAT_BEST_PCT: f64 = 15.0;
const BODY_FAT_WORST_PCT: f64 = 30.0;

const STEPS_TARGET: f64 = 12_000.0;
const EXERCISE_MINUTES_TARGET: f64 = 30.0;
const STEPS_SHARE: f64 = 0.6;
const EXERCISE_SHARE: f64 = 0.4;

// 7.5h asleep; each 150 min away from target costs 60 points
const SLEEP_TARGET_MINUTES: f64 = 450.0;
const SLEEP_DEVIATION_SPAN_MINUTES: f64 = 150.0;
const SLEEP_DEVIATION_PENALTY: f64 = 60.0;
const SLEEP_SHARE: f64 = 0.66;
const RHR_SHARE: f64 = 0.34;

/// Resting HR buckets as (upper bound inclusive, score), checked top-down
pub const RHR_BUCKETS: &[(f64, f64)] = &[(55.0, 90.0), (60.0, 80.0), (70.0, 60.0), (80.0, 40.0)];
const RHR_ABOVE_BUCKETS_SCORE: f64 = 20.0;

/// Low-HRV penalties as (upper bound exclusive, points), checked top-down
pub const HRV_PENALTIES: &[(f64, f64)] = &[(25.0, 20.0), (35.0, 15.0), (45.0, 10.0), (55.0, 5.0)];

const YEARS_PER_COMPOSITE_POINT: f64 = 0.2;
const MAX_IMPROVEMENT_YEARS: f64 = 10.0;

/// ---------------------------------------------------------------------------
/// Window Averages
/// ---------------------------------------------------------------------------

/// Null-excluding means over the scoring window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowAverages {
  pub body_fat_pct: Option<f64>,
  pub steps: Option<f64>,
  pub exercise_minutes: Option<f64>,
  pub resting_hr: Option<f64>,
  pub asleep_minutes: Option<f64>,
  pub vo2_max_direct: Option<f64>,
  pub hrv_sdnn_ms: Option<f64>,
}

impl WindowAverages {
  pub fn from_rows(rows: &[DailyAggregate]) -> Self {
    Self {
      body_fat_pct: reducers::mean(rows.iter().map(|r| r.body_fat_pct)),
      steps: reducers::mean(rows.iter().map(|r| r.steps.map(|s| s as f64))),
      exercise_minutes: reducers::mean(rows.iter().map(|r| r.exercise_minutes)),
      resting_hr: reducers::mean(rows.iter().map(|r| r.resting_hr)),
      asleep_minutes: reducers::mean(rows.iter().map(|r| r.asleep_minutes)),
      vo2_max_direct: reducers::mean(rows.iter().map(|r| r.vo2_max_direct)),
      hrv_sdnn_ms: reducers::mean(rows.iter().map(|r| r.hrv_sdnn_ms)),
    }
  }
}

/// Fractional age in years on `target`
pub fn chronological_age(target: NaiveDate, birth: NaiveDate) -> f64 {
  (target - birth).num_days() as f64 / DAYS_PER_YEAR
}

/// ---------------------------------------------------------------------------
/// Sub-scores
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vo2Estimate {
  pub vo2: f64,
  pub used_direct: bool,
}

/// Prefer a measured VO2max; otherwise estimate from resting HR, age and
/// exercise minutes; otherwise fall back to a neutral value.
pub fn estimate_vo2(averages: &WindowAverages, chrono_years: f64) -> Vo2Estimate {
  if let Some(direct) = averages.vo2_max_direct {
    return Vo2Estimate {
      vo2: direct,
      used_direct: true,
    };
  }

  let vo2 = match averages.resting_hr {
    Some(rhr) => {
      let exercise = averages.exercise_minutes.unwrap_or(0.0);
      38.0 - 0.15 * (chrono_years - 40.0) - 0.15 * (rhr - 60.0) + 0.01 * exercise
    }
    None => VO2_NEUTRAL_DEFAULT,
  };

  Vo2Estimate {
    vo2,
    used_direct: false,
  }
}

pub fn crf_score(vo2: f64) -> f64 {
  ((vo2 - VO2_FLOOR) / (VO2_CEILING - VO2_FLOOR) * 100.0).clamp(0.0, 100.0)
}

pub fn body_comp_score(body_fat_pct: Option<f64>) -> f64 {
  match body_fat_pct {
    None => NEUTRAL_SCORE,
    Some(pct) if pct <= BODY_FAT_BEST_PCT => 100.0,
    Some(pct) if pct >= BODY_FAT_WORST_PCT => 0.0,
    Some(pct) => (BODY_FAT_WORST_PCT - pct) / (BODY_FAT_WORST_PCT - BODY_FAT_BEST_PCT) * 100.0,
  }
}

pub fn activity_score(steps: Option<f64>, exercise_minutes: Option<f64>) -> f64 {
  let steps_score = steps
    .map(|s| (s / STEPS_TARGET * 100.0).clamp(0.0, 100.0))
    .unwrap_or(0.0);
  let exercise_score = exercise_minutes
    .map(|m| (m / EXERCISE_MINUTES_TARGET * 100.0).clamp(0.0, 100.0))
    .unwrap_or(0.0);

  STEPS_SHARE * steps_score + EXERCISE_SHARE * exercise_score
}

pub fn sleep_score(asleep_minutes: Option<f64>) -> f64 {
  match asleep_minutes {
    None => NEUTRAL_SCORE,
    Some(minutes) => {
      let deviation = (minutes - SLEEP_TARGET_MINUTES).abs();
      (100.0 - deviation / SLEEP_DEVIATION_SPAN_MINUTES * SLEEP_DEVIATION_PENALTY).clamp(0.0, 100.0)
    }
  }
}

/// Bucketed resting HR score, reduced further when HRV is low
pub fn rhr_score(resting_hr: Option<f64>, hrv_sdnn_ms: Option<f64>) -> f64 {
  let base = match resting_hr {
    None => NEUTRAL_SCORE,
    Some(rhr) => RHR_BUCKETS
      .iter()
      .find(|(upper, _)| rhr <= *upper)
      .map(|(_, score)| *score)
      .unwrap_or(RHR_ABOVE_BUCKETS_SCORE),
  };

  (base - hrv_penalty(hrv_sdnn_ms)).clamp(0.0, 100.0)
}

pub fn hrv_penalty(hrv_sdnn_ms: Option<f64>) -> f64 {
  hrv_sdnn_ms
    .and_then(|hrv| HRV_PENALTIES.iter().find(|(upper, _)| hrv < *upper))
    .map(|(_, points)| *points)
    .unwrap_or(0.0)
}

pub fn recovery_score(averages: &WindowAverages) -> f64 {
  SLEEP_SHARE * sleep_score(averages.asleep_minutes)
    + RHR_SHARE * rhr_score(averages.resting_hr, averages.hrv_sdnn_ms)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
  pub crf: f64,
  pub body_comp: f64,
  pub activity: f64,
  pub recovery: f64,
}

impl SubScores {
  pub fn composite(&self) -> f64 {
    CRF_WEIGHT * self.crf
      + BODY_COMP_WEIGHT * self.body_comp
      + ACTIVITY_WEIGHT * self.activity
      + RECOVERY_WEIGHT * self.recovery
  }
}

/// ---------------------------------------------------------------------------
/// Body Age
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyAge {
  pub years: f64,
  pub cap_applied: bool,
}

/// Convert a composite into a body age. A body age exactly 10 years below
/// chronological age is allowed; anything lower is clamped to that floor.
pub fn body_age(chrono_years: f64, composite: f64) -> BodyAge {
  let raw = chrono_years - YEARS_PER_COMPOSITE_POINT * (composite - NEUTRAL_SCORE);
  let floor = chrono_years - MAX_IMPROVEMENT_YEARS;

  if raw < floor {
    BodyAge {
      years: floor,
      cap_applied: true,
    }
  } else {
    BodyAge {
      years: raw,
      cap_applied: false,
    }
  }
}

/// Full unrounded score for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyAgeScore {
  pub subscores: SubScores,
  pub composite: f64,
  pub chrono_years: f64,
  pub body_age_years: f64,
  pub used_vo2max_direct: bool,
  pub cap_applied: bool,
}

impl BodyAgeScore {
  pub fn compute(averages: &WindowAverages, chrono_years: f64) -> Self {
    let vo2 = estimate_vo2(averages, chrono_years);
    let subscores = SubScores {
      crf: crf_score(vo2.vo2),
      body_comp: body_comp_score(averages.body_fat_pct),
      activity: activity_score(averages.steps, averages.exercise_minutes),
      recovery: recovery_score(averages),
    };
    let composite = subscores.composite();
    let age = body_age(chrono_years, composite);

    Self {
      subscores,
      composite,
      chrono_years,
      body_age_years: age.years,
      used_vo2max_direct: vo2.used_direct,
      cap_applied: age.cap_applied,
    }
  }

  /// Round to one decimal place for storage
  pub fn to_record(&self, date: NaiveDate, computed_at: DateTime<Utc>) -> BodyAgeRecord {
    BodyAgeRecord {
      date,
      input_window_days: INPUT_WINDOW_DAYS,
      crf_score: round1(self.subscores.crf),
      body_comp_score: round1(self.subscores.body_comp),
      activity_score: round1(self.subscores.activity),
      recovery_score: round1(self.subscores.recovery),
      composite_score: round1(self.composite),
      body_age_years: round1(self.body_age_years),
      age_delta_years: round1(self.body_age_years - self.chrono_years),
      used_vo2max_direct: self.used_vo2max_direct,
      cap_applied: self.cap_applied,
      computed_at,
    }
  }
}

pub fn round1(value: f64) -> f64 {
  (value * 10.0).round() / 10.0
}
