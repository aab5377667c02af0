//! Stats module - category counts and grouped means

mod calculator;

pub use calculator::{DepartmentSummary, FrequencyCount, GroupedMean, StatsCalculator, StatsError};
