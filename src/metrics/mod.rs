//! Sample types, grouped aggregation, and the collector task.
mod aggregate;
mod collector;
mod types;


pub use aggregate::{Aggregator, GroupAccumulator, aggregate};
pub use collector::{SampleObserver, setup_collector};
pub use types::{
    FailureTally, GroupKey, MetricsReport, SampleOutcome, SampleResult, Summary,
};
