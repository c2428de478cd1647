use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::args::GroupBy;
use crate::domain::RequestSpec;
use crate::error::FetchError;

/// Measured outcome of one executed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleResult {
    pub spec: RequestSpec,
    pub url: String,
    pub status: u16,
    pub elapsed: Duration,
    pub response_bytes: u64,
}

impl SampleResult {
    #[must_use]
    pub const fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// `1 / elapsed`, or 0 for a zero elapsed time.
    #[must_use]
    pub fn req_per_second(&self) -> f64 {
        let elapsed = self.elapsed_seconds();
        if elapsed > 0.0 { 1.0 / elapsed } else { 0.0 }
    }

    #[must_use]
    pub fn time_per_request_ms(&self) -> f64 {
        self.elapsed_seconds() * 1000.0
    }

    /// Body kilobytes (1024 bytes) per second, or 0 for a zero elapsed time.
    #[must_use]
    pub fn transfer_rate_kbps(&self) -> f64 {
        let elapsed = self.elapsed_seconds();
        if elapsed > 0.0 {
            bytes_as_f64(self.response_bytes) / 1024.0 / elapsed
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// What a dispatcher slot emits for each spec it attempted.
#[derive(Debug)]
pub enum SampleOutcome {
    Sample(SampleResult),
    Failed {
        spec: RequestSpec,
        url: String,
        error: FetchError,
    },
}

impl SampleOutcome {
    #[must_use]
    pub const fn spec(&self) -> &RequestSpec {
        match self {
            SampleOutcome::Sample(sample) => &sample.spec,
            SampleOutcome::Failed { spec, .. } => spec,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            SampleOutcome::Sample(sample) => &sample.url,
            SampleOutcome::Failed { url, .. } => url,
        }
    }
}

/// Bucket a sample belongs to under the configured [`GroupBy`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    All,
    Domain(String),
    Format(String),
    DomainFormat(String, String),
    Width(u32),
}

impl GroupKey {
    #[must_use]
    pub fn for_spec(group_by: GroupBy, spec: &RequestSpec) -> Self {
        match group_by {
            GroupBy::None => GroupKey::All,
            GroupBy::Domain => GroupKey::Domain(spec.domain.clone()),
            GroupBy::Format => GroupKey::Format(spec.format.clone()),
            GroupBy::DomainFormat => {
                GroupKey::DomainFormat(spec.domain.clone(), spec.format.clone())
            }
            GroupBy::Width => GroupKey::Width(spec.width),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::All => f.write_str("all"),
            GroupKey::Domain(domain) => f.write_str(domain),
            GroupKey::Format(format) => f.write_str(format),
            GroupKey::DomainFormat(domain, format) => write!(f, "{}/{}", domain, format),
            GroupKey::Width(width) => write!(f, "{}", width),
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Reduction of a non-empty group of samples. Times are in seconds unless
/// the field name says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: u64,
    pub avg_elapsed: f64,
    pub avg_req_per_second: f64,
    pub avg_time_per_request_ms: f64,
    pub avg_transfer_rate_kbps: f64,
    pub avg_response_bytes: f64,
    pub max_elapsed: f64,
    pub min_elapsed: f64,
    /// Samples whose status was not 2xx.
    pub non_success: u64,
}

/// Failed requests of one group, by failure kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureTally {
    pub count: u64,
    pub by_kind: BTreeMap<&'static str, u64>,
}

impl FailureTally {
    pub fn record(&mut self, error: &FetchError) {
        self.count = self.count.saturating_add(1);
        let slot = self.by_kind.entry(error.kind()).or_insert(0);
        *slot = slot.saturating_add(1);
    }
}

/// Terminal result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub group_by: GroupBy,
    pub groups: BTreeMap<GroupKey, Summary>,
    pub failures: BTreeMap<GroupKey, FailureTally>,
    /// Specs that were planned.
    pub planned: u64,
    /// Outcomes folded (samples plus failures).
    pub completed: u64,
    pub failed: u64,
    /// True when the run stopped before every planned spec was attempted.
    pub cancelled: bool,
    #[serde(serialize_with = "serialize_duration_ms", rename = "duration_ms")]
    pub duration: Duration,
}

impl MetricsReport {
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.groups.values().map(|summary| summary.count).sum()
    }
}

fn serialize_duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

pub(crate) const fn bytes_as_f64(bytes: u64) -> f64 {
    bytes as f64
}

pub(crate) const fn count_as_f64(count: u64) -> f64 {
    count as f64
}
