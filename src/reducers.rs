//! Reduction policies for collapsing many source rows onto one value
//!
//! Every function here treats `None` inputs as absent rather than zero, and
//! returns `None` when nothing was present, except `strength_volume` which
//! always yields a number.

use crate::models::{HeartRateSummary, SleepEpisode, StrengthSet};

/// ---------------------------------------------------------------------------
/// Generic Reducers
/// ---------------------------------------------------------------------------

/// Sum of the present values, `None` if there were none
pub fn sum<I>(values: I) -> Option<f64>
where
  I: IntoIterator<Item = Option<f64>>,
{
  values
    .into_iter()
    .flatten()
    .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Arithmetic mean of the present values, `None` if there were none
pub fn mean<I>(values: I) -> Option<f64>
where
  I: IntoIterator<Item = Option<f64>>,
{
  let (total, count) = values
    .into_iter()
    .flatten()
    .fold((0.0, 0usize), |(total, count), v| (total + v, count + 1));

  if count == 0 {
    None
  } else {
    Some(total / count as f64)
  }
}

/// ---------------------------------------------------------------------------
/// Heart Rate (one summary per recording device)
/// ---------------------------------------------------------------------------

pub fn min_of_mins(summaries: &[&HeartRateSummary]) -> Option<i64> {
  summaries.iter().filter_map(|s| s.hr_min).min()
}

pub fn avg_of_avgs(summaries: &[&HeartRateSummary]) -> Option<f64> {
  mean(summaries.iter().map(|s| s.hr_avg))
}

pub fn max_of_maxes(summaries: &[&HeartRateSummary]) -> Option<i64> {
  summaries.iter().filter_map(|s| s.hr_max).max()
}

/// ---------------------------------------------------------------------------
/// Sleep
/// ---------------------------------------------------------------------------

/// Pick the single longest episode by time asleep; episodes are never summed.
/// Ties go to the episode that started first.
pub fn longest_episode<'a>(episodes: &[&'a SleepEpisode]) -> Option<&'a SleepEpisode> {
  episodes.iter().copied().reduce(|best, candidate| {
    let best_hrs = best.total_sleep_hrs.unwrap_or(0.0);
    let candidate_hrs = candidate.total_sleep_hrs.unwrap_or(0.0);
    if candidate_hrs > best_hrs
      || (candidate_hrs == best_hrs && candidate.sleep_start < best.sleep_start)
    {
      candidate
    } else {
      best
    }
  })
}

/// ---------------------------------------------------------------------------
/// Strength
/// ---------------------------------------------------------------------------

/// Sum of weight x reps; a set missing either side contributes zero
pub fn strength_volume(sets: &[&StrengthSet]) -> f64 {
  sets
    .iter()
    .map(|s| match (s.weight_kg, s.reps) {
      (Some(weight), Some(reps)) => weight * reps as f64,
      _ => 0.0,
    })
    .sum()
}
