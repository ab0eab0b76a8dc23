//! Data-access layer over the two derived tables
//!
//! `daily_aggregates` has two writers with disjoint columns: the aggregator
//! replaces the metric columns through [`daily::replace_range`], the scorer
//! sets the body-age columns through [`daily::write_body_age`]. Nothing else
//! writes to it.

pub mod body_age;
pub mod daily;
