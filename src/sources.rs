//! Source tables fed by the ingestion connectors
//!
//! Connectors write through the `save_*` helpers (each an upsert on the
//! row's natural key, so re-importing a file is harmless). The aggregator
//! reads back through the `load_*` helpers.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::models::{
  BodyCompositionSample, HeartRateSummary, MetricSample, SleepEpisode, StrengthSet,
};

/// ---------------------------------------------------------------------------
/// Writes
/// ---------------------------------------------------------------------------

pub async fn save_body_composition(
  pool: &SqlitePool,
  sample: &BodyCompositionSample,
) -> Result<(), sqlx::Error> {
  sqlx::query(
    r#"
    INSERT INTO body_composition (date, weight_kg, body_fat_pct, muscle_pct, water_pct)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(date) DO UPDATE SET
      weight_kg = excluded.weight_kg,
      body_fat_pct = excluded.body_fat_pct,
      muscle_pct = excluded.muscle_pct,
      water_pct = excluded.water_pct
    "#,
  )
  .bind(sample.date)
  .bind(sample.weight_kg)
  .bind(sample.body_fat_pct)
  .bind(sample.muscle_pct)
  .bind(sample.water_pct)
  .execute(pool)
  .await?;

  Ok(())
}

pub async fn save_metric_sample(pool: &SqlitePool, sample: &MetricSample) -> Result<(), sqlx::Error> {
  sqlx::query(
    r#"
    INSERT INTO metric_samples (date, device, metric, value)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(metric, device, date) DO UPDATE SET
      value = excluded.value
    "#,
  )
  .bind(sample.date)
  .bind(&sample.device)
  .bind(&sample.metric)
  .bind(sample.value)
  .execute(pool)
  .await?;

  Ok(())
}

pub async fn save_heart_rate_summary(
  pool: &SqlitePool,
  summary: &HeartRateSummary,
) -> Result<(), sqlx::Error> {
  sqlx::query(
    r#"
    INSERT INTO heart_rate_summaries (date, device, hr_min, hr_avg, hr_max)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(device, date) DO UPDATE SET
      hr_min = excluded.hr_min,
      hr_avg = excluded.hr_avg,
      hr_max = excluded.hr_max
    "#,
  )
  .bind(summary.date)
  .bind(&summary.device)
  .bind(summary.hr_min)
  .bind(summary.hr_avg)
  .bind(summary.hr_max)
  .execute(pool)
  .await?;

  Ok(())
}

pub async fn save_sleep_episode(pool: &SqlitePool, episode: &SleepEpisode) -> Result<(), sqlx::Error> {
  sqlx::query(
    r#"
    INSERT INTO sleep_episodes (
      date, device, sleep_start, sleep_end, in_bed_start, in_bed_end,
      total_sleep_hrs, core_hrs, deep_hrs, rem_hrs, awake_hrs
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT(device, date, sleep_start) DO UPDATE SET
      sleep_end = excluded.sleep_end,
      in_bed_start = excluded.in_bed_start,
      in_bed_end = excluded.in_bed_end,
      total_sleep_hrs = excluded.total_sleep_hrs,
      core_hrs = excluded.core_hrs,
      deep_hrs = excluded.deep_hrs,
      rem_hrs = excluded.rem_hrs,
      awake_hrs = excluded.awake_hrs
    "#,
  )
  .bind(episode.date)
  .bind(&episode.device)
  .bind(episode.sleep_start)
  .bind(episode.sleep_end)
  .bind(episode.in_bed_start)
  .bind(episode.in_bed_end)
  .bind(episode.total_sleep_hrs)
  .bind(episode.core_hrs)
  .bind(episode.deep_hrs)
  .bind(episode.rem_hrs)
  .bind(episode.awake_hrs)
  .execute(pool)
  .await?;

  Ok(())
}

pub async fn save_strength_set(pool: &SqlitePool, set: &StrengthSet) -> Result<(), sqlx::Error> {
  sqlx::query(
    r#"
    INSERT INTO strength_sets (date, exercise_id, set_number, reps, weight_kg, rir)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(date, exercise_id, set_number) DO UPDATE SET
      reps = excluded.reps,
      weight_kg = excluded.weight_kg,
      rir = excluded.rir
    "#,
  )
  .bind(set.date)
  .bind(set.exercise_id)
  .bind(set.set_number)
  .bind(set.reps)
  .bind(set.weight_kg)
  .bind(set.rir)
  .execute(pool)
  .await?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Range Reads
/// ---------------------------------------------------------------------------

/// Every source row dated within an inclusive range
#[derive(Debug, Clone, Default)]
pub struct SourceRows {
  pub body_composition: Vec<BodyCompositionSample>,
  pub metrics: Vec<MetricSample>,
  pub heart_rate: Vec<HeartRateSummary>,
  pub sleep: Vec<SleepEpisode>,
  pub strength: Vec<StrengthSet>,
}

pub async fn load_range(
  pool: &SqlitePool,
  start: NaiveDate,
  end: NaiveDate,
) -> Result<SourceRows, sqlx::Error> {
  let body_composition = sqlx::query_as::<_, BodyCompositionSample>(
    r#"
    SELECT date, weight_kg, body_fat_pct, muscle_pct, water_pct
    FROM body_composition
    WHERE date BETWEEN ?1 AND ?2
    ORDER BY date
    "#,
  )
  .bind(start)
  .bind(end)
  .fetch_all(pool)
  .await?;

  let metrics = sqlx::query_as::<_, MetricSample>(
    r#"
    SELECT date, device, metric, value
    FROM metric_samples
    WHERE date BETWEEN ?1 AND ?2
    ORDER BY date, metric, device
    "#,
  )
  .bind(start)
  .bind(end)
  .fetch_all(pool)
  .await?;

  let heart_rate = sqlx::query_as::<_, HeartRateSummary>(
    r#"
    SELECT date, device, hr_min, hr_avg, hr_max
    FROM heart_rate_summaries
    WHERE date BETWEEN ?1 AND ?2
    ORDER BY date, device
    "#,
  )
  .bind(start)
  .bind(end)
  .fetch_all(pool)
  .await?;

  let sleep = sqlx::query_as::<_, SleepEpisode>(
    r#"
    SELECT date, device, sleep_start, sleep_end, in_bed_start, in_bed_end,
           total_sleep_hrs, core_hrs, deep_hrs, rem_hrs, awake_hrs
    FROM sleep_episodes
    WHERE date BETWEEN ?1 AND ?2
    ORDER BY date, sleep_start
    "#,
  )
  .bind(start)
  .bind(end)
  .fetch_all(pool)
  .await?;

  let strength = sqlx::query_as::<_, StrengthSet>(
    r#"
    SELECT date, exercise_id, set_number, reps, weight_kg, rir
    FROM strength_sets
    WHERE date BETWEEN ?1 AND ?2
    ORDER BY date, exercise_id, set_number
    "#,
  )
  .bind(start)
  .bind(end)
  .fetch_all(pool)
  .await?;

  Ok(SourceRows {
    body_composition,
    metrics,
    heart_rate,
    sleep,
    strength,
  })
}

/// Earliest date present in any source table
pub async fn earliest_source_date(pool: &SqlitePool) -> Result<Option<NaiveDate>, sqlx::Error> {
  sqlx::query_scalar::<_, Option<NaiveDate>>(
    r#"
    SELECT MIN(date) FROM (
      SELECT MIN(date) AS date FROM body_composition
      UNION ALL SELECT MIN(date) FROM metric_samples
      UNION ALL SELECT MIN(date) FROM heart_rate_summaries
      UNION ALL SELECT MIN(date) FROM sleep_episodes
      UNION ALL SELECT MIN(date) FROM strength_sets
    )
    "#,
  )
  .fetch_one(pool)
  .await
}
