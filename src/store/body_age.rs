use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::BodyAgeRecord;

/// Upsert a scored record keyed by date.
///
/// When the stored row already holds the same scores the row is left alone,
/// `computed_at` included, so re-running a date with unchanged inputs leaves
/// the table byte-for-byte identical. Returns whether the row was written.
pub async fn upsert_record(
  conn: &mut SqliteConnection,
  record: &BodyAgeRecord,
) -> Result<bool, sqlx::Error> {
  let result = sqlx::query(
    r#"
    INSERT INTO body_age_daily (
      date, input_window_days, crf_score, body_comp_score, activity_score,
      recovery_score, composite_score, body_age_years, age_delta_years,
      used_vo2max_direct, cap_applied, computed_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
    ON CONFLICT(date) DO UPDATE SET
      input_window_days = excluded.input_window_days,
      crf_score = excluded.crf_score,
      body_comp_score = excluded.body_comp_score,
      activity_score = excluded.activity_score,
      recovery_score = excluded.recovery_score,
      composite_score = excluded.composite_score,
      body_age_years = excluded.body_age_years,
      age_delta_years = excluded.age_delta_years,
      used_vo2max_direct = excluded.used_vo2max_direct,
      cap_applied = excluded.cap_applied,
      computed_at = excluded.computed_at
    WHERE input_window_days IS NOT excluded.input_window_days
       OR crf_score IS NOT excluded.crf_score
       OR body_comp_score IS NOT excluded.body_comp_score
       OR activity_score IS NOT excluded.activity_score
       OR recovery_score IS NOT excluded.recovery_score
       OR composite_score IS NOT excluded.composite_score
       OR body_age_years IS NOT excluded.body_age_years
       OR age_delta_years IS NOT excluded.age_delta_years
       OR used_vo2max_direct IS NOT excluded.used_vo2max_direct
       OR cap_applied IS NOT excluded.cap_applied
    "#,
  )
  .bind(record.date)
  .bind(record.input_window_days)
  .bind(record.crf_score)
  .bind(record.body_comp_score)
  .bind(record.activity_score)
  .bind(record.recovery_score)
  .bind(record.composite_score)
  .bind(record.body_age_years)
  .bind(record.age_delta_years)
  .bind(record.used_vo2max_direct)
  .bind(record.cap_applied)
  .bind(record.computed_at)
  .execute(&mut *conn)
  .await?;

  Ok(result.rows_affected() > 0)
}

pub async fn load_record(pool: &SqlitePool, date: NaiveDate) -> Result<Option<BodyAgeRecord>, sqlx::Error> {
  sqlx::query_as::<_, BodyAgeRecord>("SELECT * FROM body_age_daily WHERE date = ?1")
    .bind(date)
    .fetch_optional(pool)
    .await
}

pub async fn load_range(
  pool: &SqlitePool,
  start: NaiveDate,
  end: NaiveDate,
) -> Result<Vec<BodyAgeRecord>, sqlx::Error> {
  sqlx::query_as::<_, BodyAgeRecord>(
    "SELECT * FROM body_age_daily WHERE date BETWEEN ?1 AND ?2 ORDER BY date",
  )
  .bind(start)
  .bind(end)
  .fetch_all(pool)
  .await
}

/// Most recent record dated on or before `date`
pub async fn latest_on_or_before(
  pool: &SqlitePool,
  date: NaiveDate,
) -> Result<Option<BodyAgeRecord>, sqlx::Error> {
  sqlx::query_as::<_, BodyAgeRecord>(
    "SELECT * FROM body_age_daily WHERE date <= ?1 ORDER BY date DESC LIMIT 1",
  )
  .bind(date)
  .fetch_optional(pool)
  .await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::*;
  use chrono::{Duration, Utc};

  #[tokio::test]
  async fn test_upsert_record_roundtrip() {
    let pool = setup_test_db().await;
    let record = mock_body_age_record(date(2024, 1, 15), 30.3);

    let mut conn = pool.acquire().await.unwrap();
    assert!(upsert_record(&mut *conn, &record).await.unwrap());
    drop(conn);

    let stored = load_record(&pool, record.date).await.unwrap();
    assert_eq!(stored, Some(record));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_upsert_record_unchanged_keeps_computed_at() {
    let pool = setup_test_db().await;
    let first = mock_body_age_record(date(2024, 1, 15), 30.3);
    let mut rerun = first.clone();
    rerun.computed_at = first.computed_at + Duration::hours(1);

    let mut conn = pool.acquire().await.unwrap();
    upsert_record(&mut *conn, &first).await.unwrap();
    let written = upsert_record(&mut *conn, &rerun).await.unwrap();
    drop(conn);

    assert!(!written);
    let stored = load_record(&pool, first.date).await.unwrap().unwrap();
    assert_eq!(stored.computed_at, first.computed_at);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_upsert_record_changed_overwrites() {
    let pool = setup_test_db().await;
    let first = mock_body_age_record(date(2024, 1, 15), 30.3);
    let mut changed = mock_body_age_record(date(2024, 1, 15), 29.9);
    changed.computed_at = Utc::now();

    let mut conn = pool.acquire().await.unwrap();
    upsert_record(&mut *conn, &first).await.unwrap();
    assert!(upsert_record(&mut *conn, &changed).await.unwrap());
    drop(conn);

    let all = load_range(&pool, date(2024, 1, 1), date(2024, 1, 31)).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].body_age_years, 29.9);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_latest_on_or_before() {
    let pool = setup_test_db().await;

    let mut conn = pool.acquire().await.unwrap();
    for (day, age) in [(date(2024, 1, 10), 31.0), (date(2024, 1, 12), 30.8), (date(2024, 1, 20), 30.1)] {
      upsert_record(&mut *conn, &mock_body_age_record(day, age)).await.unwrap();
    }
    drop(conn);

    let latest = latest_on_or_before(&pool, date(2024, 1, 15)).await.unwrap().unwrap();
    assert_eq!(latest.date, date(2024, 1, 12));

    let none = latest_on_or_before(&pool, date(2024, 1, 1)).await.unwrap();
    assert!(none.is_none());

    teardown_test_db(pool).await;
  }
}
