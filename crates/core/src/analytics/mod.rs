//! Period-over-period analytics.
//!
//! Each metric is measured over the requested window and over the
//! equal-length window right before it; the percent delta uses one shared
//! zero-handling and rounding rule.

pub mod comparison;
pub mod memory;
pub mod service;
pub mod source;
pub mod types;

pub use comparison::{compare_range, percent_delta, previous_period, round2};
pub use memory::InMemoryOrderBook;
pub use service::AnalyticsService;
pub use source::{OrderMetrics, OrderRecord};
pub use types::{AnalyticsOverview, ComparisonResult, Metric, Period};
