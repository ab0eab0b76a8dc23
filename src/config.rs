//! Runtime settings read from the environment (and `.env` via dotenvy)

use std::env;

use chrono::NaiveDate;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://body-age.db?mode=rwc";
pub const DEFAULT_REFRESH_DAYS: i64 = 7;
/// Ten years of daily rescoring
pub const MAX_REFRESH_DAYS: i64 = 3660;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
  #[error("Invalid value for {name}: {value}")]
  Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub database_url: String,
  /// Required to score; aggregation runs without it
  pub birth_date: Option<NaiveDate>,
  /// Trailing days rescored on each refresh, ending today
  pub refresh_days: i64,
  pub log_level: String,
}

impl Settings {
  pub fn from_env() -> Result<Self, ConfigError> {
    let database_url =
      env::var("BODY_AGE_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

    let birth_date = match env::var("BODY_AGE_BIRTH_DATE") {
      Ok(raw) => Some(
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ConfigError::Invalid {
          name: "BODY_AGE_BIRTH_DATE",
          value: raw.clone(),
        })?,
      ),
      Err(_) => None,
    };

    let refresh_days = match env::var("BODY_AGE_REFRESH_DAYS") {
      Ok(raw) => match raw.trim().parse::<i64>() {
        Ok(days) if (1..=MAX_REFRESH_DAYS).contains(&days) => days,
        _ => {
          return Err(ConfigError::Invalid {
            name: "BODY_AGE_REFRESH_DAYS",
            value: raw,
          })
        }
      },
      Err(_) => DEFAULT_REFRESH_DAYS,
    };

    let log_level = env::var("BODY_AGE_LOG")
      .or_else(|_| env::var("RUST_LOG"))
      .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

    Ok(Self {
      database_url,
      birth_date,
      refresh_days,
      log_level,
    })
  }
}
