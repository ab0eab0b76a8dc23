use tracing_subscriber::EnvFilter;

/// Install the global subscriber: compact lines on stderr, filtered by `level`
/// (any `EnvFilter` directive, e.g. `info` or `body_age=debug,sqlx=warn`).
/// An unparseable directive falls back to `info`.
pub fn init(level: &str) {
  let combined_filter = format!("{},sqlx=warn", level);
  let env_filter =
    EnvFilter::try_new(&combined_filter).unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

  let installed = tracing_subscriber::fmt()
    .compact()
    .with_writer(std::io::stderr)
    .with_ansi(false)
    .with_target(false)
    .with_env_filter(env_filter)
    .try_init();

  if installed.is_ok() {
    tracing::info!("body-age: log filter: {}", combined_filter);
  }
}
