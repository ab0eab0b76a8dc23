use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::DailyAggregate;

/// Load aggregate rows for an inclusive date range, oldest first
pub async fn load_range(
  pool: &SqlitePool,
  start: NaiveDate,
  end: NaiveDate,
) -> Result<Vec<DailyAggregate>, sqlx::Error> {
  sqlx::query_as::<_, DailyAggregate>(
    r#"
    SELECT *
    FROM daily_aggregates
    WHERE date BETWEEN ?1 AND ?2
    ORDER BY date
    "#,
  )
  .bind(start)
  .bind(end)
  .fetch_all(pool)
  .await
}

/// Aggregator write path: upsert every row in one transaction.
///
/// Only metric columns are written. On insert the body-age columns are seeded
/// from `body_age_daily`; on conflict they are left as the scorer set them.
pub async fn replace_range(pool: &SqlitePool, rows: &[DailyAggregate]) -> Result<(), sqlx::Error> {
  let mut tx = pool.begin().await?;

  for row in rows {
    upsert_metrics(&mut *tx, row).await?;
  }

  tx.commit().await?;
  Ok(())
}

async fn upsert_metrics(conn: &mut SqliteConnection, row: &DailyAggregate) -> Result<(), sqlx::Error> {
  sqlx::query(
    r#"
    INSERT INTO daily_aggregates (
      date, weight_kg, body_fat_pct, muscle_pct, water_pct,
      steps, exercise_minutes, active_calories, resting_calories, stand_minutes, distance_m,
      resting_hr, avg_hr, max_hr, min_hr, hrv_sdnn_ms, vo2_max_direct,
      total_sleep_minutes, asleep_minutes, rem_minutes, deep_minutes, core_minutes, awake_minutes,
      strength_volume, body_age_years, body_age_delta_years
    )
    VALUES (
      ?1, ?2, ?3, ?4, ?5,
      ?6, ?7, ?8, ?9, ?10, ?11,
      ?12, ?13, ?14, ?15, ?16, ?17,
      ?18, ?19, ?20, ?21, ?22, ?23,
      ?24,
      (SELECT body_age_years FROM body_age_daily WHERE date = ?1),
      (SELECT age_delta_years FROM body_age_daily WHERE date = ?1)
    )
    ON CONFLICT(date) DO UPDATE SET
      weight_kg = excluded.weight_kg,
      body_fat_pct = excluded.body_fat_pct,
      muscle_pct = excluded.muscle_pct,
      water_pct = excluded.water_pct,
      steps = excluded.steps,
      exercise_minutes = excluded.exercise_minutes,
      active_calories = excluded.active_calories,
      resting_calories = excluded.resting_calories,
      stand_minutes = excluded.stand_minutes,
      distance_m = excluded.distance_m,
      resting_hr = excluded.resting_hr,
      avg_hr = excluded.avg_hr,
      max_hr = excluded.max_hr,
      min_hr = excluded.min_hr,
      hrv_sdnn_ms = excluded.hrv_sdnn_ms,
      vo2_max_direct = excluded.vo2_max_direct,
      total_sleep_minutes = excluded.total_sleep_minutes,
      asleep_minutes = excluded.asleep_minutes,
      rem_minutes = excluded.rem_minutes,
      deep_minutes = excluded.deep_minutes,
      core_minutes = excluded.core_minutes,
      awake_minutes = excluded.awake_minutes,
      strength_volume = excluded.strength_volume
    "#,
  )
  .bind(row.date)
  .bind(row.weight_kg)
  .bind(row.body_fat_pct)
  .bind(row.muscle_pct)
  .bind(row.water_pct)
  .bind(row.steps)
  .bind(row.exercise_minutes)
  .bind(row.active_calories)
  .bind(row.resting_calories)
  .bind(row.stand_minutes)
  .bind(row.distance_m)
  .bind(row.resting_hr)
  .bind(row.avg_hr)
  .bind(row.max_hr)
  .bind(row.min_hr)
  .bind(row.hrv_sdnn_ms)
  .bind(row.vo2_max_direct)
  .bind(row.total_sleep_minutes)
  .bind(row.asleep_minutes)
  .bind(row.rem_minutes)
  .bind(row.deep_minutes)
  .bind(row.core_minutes)
  .bind(row.awake_minutes)
  .bind(row.strength_volume)
  .execute(&mut *conn)
  .await?;

  Ok(())
}

/// Scorer write path: set the two derived columns for one date.
/// Returns the number of rows touched (0 when the date has no aggregate row).
pub async fn write_body_age(
  conn: &mut SqliteConnection,
  date: NaiveDate,
  body_age_years: f64,
  body_age_delta_years: f64,
) -> Result<u64, sqlx::Error> {
  let result = sqlx::query(
    r#"
    UPDATE daily_aggregates
    SET body_age_years = ?1,
        body_age_delta_years = ?2
    WHERE date = ?3
    "#,
  )
  .bind(body_age_years)
  .bind(body_age_delta_years)
  .bind(date)
  .execute(&mut *conn)
  .await?;

  Ok(result.rows_affected())
}
