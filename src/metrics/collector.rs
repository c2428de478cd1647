use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::args::GroupBy;

use super::{Aggregator, SampleOutcome};

/// Called for every outcome before it is folded (e.g. to print a table row).
pub type SampleObserver = Box<dyn FnMut(&SampleOutcome) + Send>;

/// Spawns the single consumer that owns all accumulators. The task ends when
/// every outcome sender is dropped and returns the aggregator.
#[must_use]
pub fn setup_collector(
    group_by: GroupBy,
    mut observer: Option<SampleObserver>,
    mut outcome_rx: mpsc::Receiver<SampleOutcome>,
) -> JoinHandle<Aggregator> {
    tokio::spawn(async move {
        let mut aggregator = Aggregator::new(group_by);
        while let Some(outcome) = outcome_rx.recv().await {
            match &outcome {
                SampleOutcome::Sample(sample) => debug!(
                    spec = %sample.spec,
                    status = sample.status,
                    elapsed_ms = u64::try_from(sample.elapsed.as_millis()).unwrap_or(u64::MAX),
                    bytes = sample.response_bytes,
                    "sample"
                ),
                SampleOutcome::Failed { spec, url, error } => {
                    warn!("Request {} ({}) failed: {}", spec, url, error);
                }
            }
            if let Some(observer) = observer.as_mut() {
                observer(&outcome);
            }
            aggregator.push(&outcome);
        }
        debug!(
            completed = aggregator.completed(),
            failed = aggregator.failed(),
            "collector drained"
        );
        aggregator
    })
}
