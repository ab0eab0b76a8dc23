pub mod aggregator;
pub mod body_age;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod reducers;
pub mod scoring;
pub mod sources;
pub mod store;

#[cfg(test)]
mod test_utils;

use chrono::Local;

use config::Settings;
use pipeline::PipelineError;

/// Batch entry point: one aggregate-and-score pass, then exit
pub async fn run() -> Result<(), PipelineError> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let settings = Settings::from_env()?;
  logging::init(&settings.log_level);

  let pool = db::initialize_db(&settings.database_url).await?;
  let today = Local::now().date_naive();

  let result = pipeline::refresh(&pool, &settings, today).await;
  pool.close().await;

  let summary = result?;
  if let Some(latest) = &summary.latest {
    tracing::info!(
      date = %latest.date,
      body_age = latest.body_age_years,
      delta = latest.age_delta_years,
      "Latest body age"
    );
  }

  Ok(())
}
