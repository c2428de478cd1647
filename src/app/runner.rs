use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::args::BenchArgs;
use crate::error::{AppError, AppResult, HttpError, MetricsError, ValidationError};
use crate::http::{
    DispatchPlan, Fetch, HttpFetcher, expand_specs, planned_requests, spawn_dispatcher,
};
use crate::metrics::{MetricsReport, SampleObserver, SampleOutcome, setup_collector};
use crate::shutdown::{ShutdownSender, setup_signal_shutdown_handler, shutdown_channel};

use super::export::{export_report, resolve_output_format};
use super::summary::{format_sample_row, render_report, sample_table_header};

/// Outcomes buffered between the workers and the collector.
const OUTCOME_CHANNEL_CAPACITY: usize = 1024;

/// Runs one benchmark end to end: dispatch, aggregate, print, and export.
///
/// # Errors
///
/// Returns an error for invalid selectors or templates, when the HTTP client
/// cannot be built, when a background task dies, when the report cannot be
/// written, or under `--strict` when any request failed.
pub async fn run_bench(args: BenchArgs) -> AppResult<()> {
    let output_format = resolve_output_format(args.output.as_deref(), args.output_format)?;
    let fetcher: Arc<dyn Fetch> = Arc::new(HttpFetcher::new(&args)?);

    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    let run_result = run_with_fetcher(&args, fetcher, &shutdown_tx).await;
    drop(shutdown_tx.send(()));
    if let Err(err) = signal_handle.await {
        warn!("Signal handler task failed: {}", err);
    }
    let report = run_result?;

    print!("{}", render_report(&report)?);

    if let (Some(path), Some(format)) = (args.output.as_deref(), output_format) {
        export_report(path, format, &report).await?;
        info!("Report written to {}.", path);
    }

    if args.strict && report.failed > 0 {
        return Err(AppError::validation(ValidationError::RuntimeErrors {
            failed: report.failed,
            attempted: report.completed,
        }));
    }
    Ok(())
}

/// Dispatches every selected spec through `fetcher` and folds the outcomes
/// into a report. A shutdown on `shutdown_tx` stops new requests and yields
/// a partial report.
///
/// # Errors
///
/// Returns an error for unknown selectors or invalid templates, or when the
/// dispatcher or collector task fails.
pub async fn run_with_fetcher(
    args: &BenchArgs,
    fetcher: Arc<dyn Fetch>,
    shutdown_tx: &ShutdownSender,
) -> AppResult<MetricsReport> {
    let templates = args
        .template_set
        .select(args.domain.as_deref(), args.format.as_deref())?;
    templates.validate()?;
    let planned = planned_requests(&templates, args.widths)?;

    let specs = expand_specs(&templates, args.widths);
    info!(
        "Benchmarking {} URLs: {} templates x {} widths ({}).",
        specs.len(),
        templates.len(),
        args.widths.len(),
        args.widths
    );
    for (domain, format, base) in templates.entries() {
        debug!(domain, format, base, "template");
    }

    let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_CAPACITY);
    let collector = setup_collector(args.group_by, sample_printer(args), outcome_rx);

    let plan = DispatchPlan {
        specs: specs.into(),
        templates: Arc::new(templates),
        concurrency: args.concurrency,
        status_policy: args.status_policy,
    };
    let started = Instant::now();
    let dispatcher = spawn_dispatcher(plan, fetcher, shutdown_tx, outcome_tx);

    let stats = dispatcher
        .await
        .map_err(|err| AppError::http(HttpError::DispatcherJoin { source: err }))?;
    let aggregator = collector
        .await
        .map_err(|err| AppError::metrics(MetricsError::CollectorJoin { source: err }))?;
    let duration = started.elapsed();
    debug!(
        workers = stats.workers,
        dispatched = stats.dispatched,
        "dispatch complete"
    );

    let report = aggregator.into_report(planned, duration)?;
    if report.cancelled {
        warn!(
            "Stopped after {} of {} requests.",
            report.completed, report.planned
        );
    }
    Ok(report)
}

fn sample_printer(args: &BenchArgs) -> Option<SampleObserver> {
    if args.no_samples {
        return None;
    }
    println!("{}", sample_table_header());
    Some(Box::new(|outcome: &SampleOutcome| {
        println!("{}", format_sample_row(outcome));
    }))
}
