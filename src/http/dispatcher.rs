use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::args::{PositiveUsize, StatusPolicy};
use crate::domain::{RequestSpec, TemplateSet};
use crate::error::FetchError;
use crate::metrics::SampleOutcome;
use crate::shutdown::{ShutdownReceiver, ShutdownSender, shutdown_requested};

use super::fetcher::{Fetch, fetch_sample};
use super::url::build_url;

/// Everything the workers share for one run.
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    pub specs: Arc<[RequestSpec]>,
    pub templates: Arc<TemplateSet>,
    pub concurrency: PositiveUsize,
    pub status_policy: StatusPolicy,
}

impl DispatchPlan {
    /// Number of worker tasks: the concurrency ceiling, capped by the spec count.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.concurrency.get().min(self.specs.len())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub workers: usize,
    /// Specs claimed and attempted by any worker.
    pub dispatched: u64,
}

struct WorkerContext {
    plan: DispatchPlan,
    cursor: Arc<AtomicUsize>,
    fetcher: Arc<dyn Fetch>,
}

/// Starts `min(concurrency, specs)` workers that claim specs through a shared
/// cursor and send one outcome per claimed spec on `outcome_tx`.
///
/// Shutdown receivers are subscribed before this returns, so a shutdown
/// broadcast right after the call stops every worker before its first claim.
/// A worker also stops once `outcome_tx`'s receiver is gone. In-flight
/// requests always run to completion.
#[must_use]
pub fn spawn_dispatcher(
    plan: DispatchPlan,
    fetcher: Arc<dyn Fetch>,
    shutdown_tx: &ShutdownSender,
    outcome_tx: mpsc::Sender<SampleOutcome>,
) -> JoinHandle<DispatchStats> {
    let workers = plan.worker_count();
    info!(
        "Dispatching {} requests across {} workers.",
        plan.specs.len(),
        workers
    );

    let context = Arc::new(WorkerContext {
        plan,
        cursor: Arc::new(AtomicUsize::new(0)),
        fetcher,
    });
    let mut worker_handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let shutdown_rx = shutdown_tx.subscribe();
        worker_handles.push(tokio::spawn(run_worker(
            worker_id,
            Arc::clone(&context),
            shutdown_rx,
            outcome_tx.clone(),
        )));
    }
    drop(outcome_tx);

    tokio::spawn(async move {
        let mut stats = DispatchStats {
            workers,
            dispatched: 0,
        };
        for handle in worker_handles {
            match handle.await {
                Ok(dispatched) => stats.dispatched = stats.dispatched.saturating_add(dispatched),
                Err(err) => error!("Dispatcher worker failed: {}", err),
            }
        }
        debug!(dispatched = stats.dispatched, "dispatcher finished");
        stats
    })
}

async fn run_worker(
    worker_id: usize,
    context: Arc<WorkerContext>,
    mut shutdown_rx: ShutdownReceiver,
    outcome_tx: mpsc::Sender<SampleOutcome>,
) -> u64 {
    let mut dispatched: u64 = 0;
    loop {
        if shutdown_requested(&mut shutdown_rx) {
            debug!(worker_id, "shutdown requested, worker stopping");
            break;
        }
        let index = context.cursor.fetch_add(1, Ordering::Relaxed);
        let Some(spec) = context.plan.specs.get(index) else {
            break;
        };

        let outcome = match build_url(
            &context.plan.templates,
            &spec.domain,
            &spec.format,
            spec.width,
        ) {
            Ok(url) => {
                fetch_sample(
                    context.fetcher.as_ref(),
                    spec.clone(),
                    url,
                    context.plan.status_policy,
                )
                .await
            }
            Err(err) => SampleOutcome::Failed {
                spec: spec.clone(),
                url: String::new(),
                error: FetchError::InvalidUrl {
                    reason: err.to_string(),
                },
            },
        };
        dispatched = dispatched.saturating_add(1);

        if outcome_tx.send(outcome).await.is_err() {
            debug!(worker_id, "outcome receiver dropped, worker stopping");
            break;
        }
    }
    dispatched
}
