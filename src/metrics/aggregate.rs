use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::args::GroupBy;
use crate::error::MetricsError;

use super::types::{
    FailureTally, GroupKey, MetricsReport, SampleOutcome, SampleResult, Summary, bytes_as_f64,
    count_as_f64,
};

/// Running sums for one group; O(1) per folded sample, no raw samples kept.
#[derive(Debug, Clone)]
pub struct GroupAccumulator {
    count: u64,
    non_success: u64,
    sum_elapsed: f64,
    sum_req_per_second: f64,
    sum_time_per_request_ms: f64,
    sum_transfer_rate_kbps: f64,
    sum_response_bytes: f64,
    max_elapsed: f64,
    min_elapsed: f64,
}

impl Default for GroupAccumulator {
    fn default() -> Self {
        Self {
            count: 0,
            non_success: 0,
            sum_elapsed: 0.0,
            sum_req_per_second: 0.0,
            sum_time_per_request_ms: 0.0,
            sum_transfer_rate_kbps: 0.0,
            sum_response_bytes: 0.0,
            max_elapsed: f64::NEG_INFINITY,
            min_elapsed: f64::INFINITY,
        }
    }
}

impl GroupAccumulator {
    pub fn record(&mut self, sample: &SampleResult) {
        let elapsed = sample.elapsed_seconds();
        self.count = self.count.saturating_add(1);
        if !sample.is_success() {
            self.non_success = self.non_success.saturating_add(1);
        }
        self.sum_elapsed += elapsed;
        self.sum_req_per_second += sample.req_per_second();
        self.sum_time_per_request_ms += sample.time_per_request_ms();
        self.sum_transfer_rate_kbps += sample.transfer_rate_kbps();
        self.sum_response_bytes += bytes_as_f64(sample.response_bytes);
        self.max_elapsed = self.max_elapsed.max(elapsed);
        self.min_elapsed = self.min_elapsed.min(elapsed);
    }

    /// Divides the running sums by the sample count.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::EmptyGroup`] when nothing was recorded.
    pub fn finalize(&self, key: &GroupKey) -> Result<Summary, MetricsError> {
        if self.count == 0 {
            return Err(MetricsError::EmptyGroup {
                group: key.to_string(),
            });
        }
        let count = count_as_f64(self.count);
        // Float rounding in the sum must not push the mean outside [min, max].
        let avg_elapsed = (self.sum_elapsed / count).clamp(self.min_elapsed, self.max_elapsed);
        Ok(Summary {
            count: self.count,
            avg_elapsed,
            avg_req_per_second: self.sum_req_per_second / count,
            avg_time_per_request_ms: self.sum_time_per_request_ms / count,
            avg_transfer_rate_kbps: self.sum_transfer_rate_kbps / count,
            avg_response_bytes: self.sum_response_bytes / count,
            max_elapsed: self.max_elapsed,
            min_elapsed: self.min_elapsed,
            non_success: self.non_success,
        })
    }
}

/// Single-consumer fold of sample outcomes into per-group accumulators.
#[derive(Debug, Clone)]
pub struct Aggregator {
    group_by: GroupBy,
    groups: BTreeMap<GroupKey, GroupAccumulator>,
    failures: BTreeMap<GroupKey, FailureTally>,
    completed: u64,
    failed: u64,
}

impl Aggregator {
    #[must_use]
    pub const fn new(group_by: GroupBy) -> Self {
        Self {
            group_by,
            groups: BTreeMap::new(),
            failures: BTreeMap::new(),
            completed: 0,
            failed: 0,
        }
    }

    #[must_use]
    pub const fn group_by(&self) -> GroupBy {
        self.group_by
    }

    #[must_use]
    pub const fn completed(&self) -> u64 {
        self.completed
    }

    #[must_use]
    pub const fn failed(&self) -> u64 {
        self.failed
    }

    pub fn push(&mut self, outcome: &SampleOutcome) {
        let key = GroupKey::for_spec(self.group_by, outcome.spec());
        self.completed = self.completed.saturating_add(1);
        match outcome {
            SampleOutcome::Sample(sample) => self.push_sample(key, sample),
            SampleOutcome::Failed { error, .. } => {
                self.failed = self.failed.saturating_add(1);
                self.failures.entry(key).or_default().record(error);
            }
        }
    }

    fn push_sample(&mut self, key: GroupKey, sample: &SampleResult) {
        self.groups.entry(key).or_default().record(sample);
    }

    /// Finalizes every group that received samples.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::EmptyGroup`] if a group exists without samples.
    pub fn summaries(&self) -> Result<BTreeMap<GroupKey, Summary>, MetricsError> {
        self.groups
            .iter()
            .map(|(key, accumulator)| Ok((key.clone(), accumulator.finalize(key)?)))
            .collect()
    }

    /// Builds the run report from everything folded so far.
    ///
    /// # Errors
    ///
    /// Propagates [`MetricsError::EmptyGroup`] from finalization.
    pub fn into_report(self, planned: u64, duration: Duration) -> Result<MetricsReport, MetricsError> {
        let groups = self.summaries()?;
        Ok(MetricsReport {
            group_by: self.group_by,
            groups,
            failures: self.failures,
            planned,
            completed: self.completed,
            failed: self.failed,
            cancelled: self.completed < planned,
            duration,
        })
    }
}

/// Drains `outcomes` to completion and returns one summary per group.
/// An empty stream yields an empty mapping.
///
/// # Errors
///
/// Returns [`MetricsError::EmptyGroup`] if finalization meets an empty group.
pub async fn aggregate(
    outcomes: &mut mpsc::Receiver<SampleOutcome>,
    group_by: GroupBy,
) -> Result<BTreeMap<GroupKey, Summary>, MetricsError> {
    let mut aggregator = Aggregator::new(group_by);
    while let Some(outcome) = outcomes.recv().await {
        aggregator.push(&outcome);
    }
    aggregator.summaries()
}
