pub mod body_age;
pub mod daily;
pub mod sources;

pub use body_age::BodyAgeRecord;
pub use daily::DailyAggregate;
pub use sources::{
  BodyCompositionSample, HeartRateSummary, MetricSample, SleepEpisode, StrengthSet,
};
