use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::export::{
    export_report, report_csv, report_json, report_jsonl, resolve_output_format,
};
use super::run_with_fetcher;
use super::summary::{format_sample_row, render_report};
use crate::args::{GroupBy, OutputFormat, parse_test_args};
use crate::domain::{RequestSpec, TemplateSet};
use crate::error::{AppError, AppResult, ConfigError, FetchError, ValidationError};
use crate::http::{Fetch, FetchResponse, MAX_REQUESTS};
use crate::metrics::{FailureTally, GroupKey, MetricsReport, SampleOutcome, SampleResult, Summary};
use crate::shutdown::{ShutdownSender, shutdown_channel};

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}

/// Answers 404 for width 13 and times out for width 7.
struct ScriptedFetcher;

#[async_trait]
impl Fetch for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        if url.ends_with("=7") {
            return Err(FetchError::Simulated { reason: "timeout" });
        }
        let status = if url.ends_with("=13") { 404 } else { 200 };
        Ok(FetchResponse {
            status,
            body_bytes: 2048,
            elapsed: Duration::from_millis(20),
        })
    }
}

/// Broadcasts a shutdown once `stop_after` requests have finished and counts
/// requests started after that point.
struct CancellingFetcher {
    stop_after: usize,
    shutdown_tx: ShutdownSender,
    started: AtomicUsize,
    finished: AtomicUsize,
    shutdown_sent: AtomicBool,
    started_after_shutdown: AtomicUsize,
}

impl CancellingFetcher {
    fn new(stop_after: usize, shutdown_tx: &ShutdownSender) -> Self {
        Self {
            stop_after,
            shutdown_tx: shutdown_tx.clone(),
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            shutdown_sent: AtomicBool::new(false),
            started_after_shutdown: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Fetch for CancellingFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchResponse, FetchError> {
        if self.shutdown_sent.load(Ordering::SeqCst) {
            self.started_after_shutdown.fetch_add(1, Ordering::SeqCst);
        }
        let call = self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;

        let finished = self.finished.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if finished == self.stop_after {
            self.shutdown_sent.store(true, Ordering::SeqCst);
            drop(self.shutdown_tx.send(()));
        }
        let jitter = u64::try_from(call % 5).unwrap_or(0).saturating_mul(10);
        Ok(FetchResponse {
            status: 200,
            body_bytes: 1024,
            elapsed: Duration::from_millis(jitter.saturating_add(10)),
        })
    }
}

fn local_templates() -> TemplateSet {
    let mut templates = TemplateSet::empty();
    templates.insert("cdnA", "webp", "http://127.0.0.1:9/a.webp?w=");
    templates.insert("cdnA", "avif", "http://127.0.0.1:9/a.avif?w=");
    templates.insert("cdnB", "webp", "http://127.0.0.1:9/b.webp?w=");
    templates
}

fn sample_report() -> MetricsReport {
    let summary = Summary {
        count: 2,
        avg_elapsed: 0.15,
        avg_req_per_second: 7.5,
        avg_time_per_request_ms: 150.0,
        avg_transfer_rate_kbps: 12.5,
        avg_response_bytes: 2048.0,
        max_elapsed: 0.2,
        min_elapsed: 0.1,
        non_success: 1,
    };
    let mut groups = BTreeMap::new();
    groups.insert(GroupKey::DomainFormat("cdnA".to_owned(), "webp".to_owned()), summary);
    let mut tally = FailureTally::default();
    tally.record(&FetchError::UnexpectedStatus { status: 503 });
    let mut failures = BTreeMap::new();
    failures.insert(GroupKey::DomainFormat("cdnB".to_owned(), "webp".to_owned()), tally);
    MetricsReport {
        group_by: GroupBy::DomainFormat,
        groups,
        failures,
        planned: 4,
        completed: 3,
        failed: 1,
        cancelled: true,
        duration: Duration::from_millis(1500),
    }
}

#[test]
fn run_groups_samples_and_isolates_failures() -> AppResult<()> {
    run_async_test(async {
        let mut args = parse_test_args([
            "imgbench",
            "--widths",
            "1-20",
            "-c",
            "3",
            "--group-by",
            "domain-format",
            "--no-samples",
        ])?;
        args.template_set = local_templates();

        let (shutdown_tx, _) = shutdown_channel();
        let report = run_with_fetcher(&args, Arc::new(ScriptedFetcher), &shutdown_tx).await?;

        if report.planned != 60 || report.completed != 60 || report.cancelled {
            return Err(AppError::validation(format!(
                "Unexpected totals: planned={} completed={}",
                report.planned, report.completed
            )));
        }
        if report.failed != 3 || report.samples() != 57 {
            return Err(AppError::validation(format!(
                "Expected 3 failures and 57 samples, got {} and {}",
                report.failed,
                report.samples()
            )));
        }
        if report.groups.len() != 3 {
            return Err(AppError::validation("Expected three domain/format groups"));
        }
        for (key, summary) in &report.groups {
            if summary.count != 19 || summary.non_success != 1 {
                return Err(AppError::validation(format!(
                    "Group {} has count {} and non-success {}",
                    key, summary.count, summary.non_success
                )));
            }
        }
        Ok(())
    })
}

#[test]
fn run_respects_selectors() -> AppResult<()> {
    run_async_test(async {
        let mut args = parse_test_args([
            "imgbench",
            "-d",
            "cdnA",
            "-f",
            "avif",
            "--widths",
            "100-104",
            "--no-samples",
        ])?;
        args.template_set = local_templates();

        let (shutdown_tx, _) = shutdown_channel();
        let report = run_with_fetcher(&args, Arc::new(ScriptedFetcher), &shutdown_tx).await?;
        let summary = report
            .groups
            .get(&GroupKey::All)
            .ok_or_else(|| AppError::validation("Missing global group"))?;
        if summary.count != 5 || report.planned != 5 {
            return Err(AppError::validation("Expected five avif samples"));
        }
        Ok(())
    })
}

#[test]
fn unknown_selector_fails_before_dispatch() -> AppResult<()> {
    run_async_test(async {
        let mut args = parse_test_args(["imgbench", "-d", "cdnZ", "--no-samples"])?;
        args.template_set = local_templates();

        let (shutdown_tx, _) = shutdown_channel();
        match run_with_fetcher(&args, Arc::new(ScriptedFetcher), &shutdown_tx).await {
            Err(AppError::Config(ConfigError::UnknownDomain { domain, .. })) if domain == "cdnZ" => {
                Ok(())
            }
            other => Err(AppError::validation(format!(
                "Expected UnknownDomain, got {:?}",
                other.map(|report| report.completed)
            ))),
        }
    })
}

#[test]
fn shutdown_mid_run_yields_partial_report() -> AppResult<()> {
    run_async_test(async {
        let mut args = parse_test_args([
            "imgbench",
            "--widths",
            "1-50",
            "-c",
            "4",
            "--group-by",
            "domain",
            "--no-samples",
        ])?;
        args.template_set = local_templates();

        let (shutdown_tx, _) = shutdown_channel();
        let fetcher = Arc::new(CancellingFetcher::new(10, &shutdown_tx));
        let report = run_with_fetcher(&args, fetcher.clone(), &shutdown_tx).await?;

        if !report.cancelled || report.planned != 150 {
            return Err(AppError::validation(format!(
                "Expected a cancelled run of 150, got cancelled={} planned={}",
                report.cancelled, report.planned
            )));
        }
        // The request that triggered shutdown plus at most three still in flight.
        if report.completed < 10 || report.completed > 13 {
            return Err(AppError::validation(format!(
                "Unexpected completed count {}",
                report.completed
            )));
        }
        let started = fetcher.started.load(Ordering::SeqCst);
        if u64::try_from(started).ok() != Some(report.completed) {
            return Err(AppError::validation(format!(
                "{} requests started but {} outcomes folded",
                started, report.completed
            )));
        }
        if fetcher.started_after_shutdown.load(Ordering::SeqCst) != 0 {
            return Err(AppError::validation("Requests started after shutdown"));
        }
        if report.samples() != report.completed || report.groups.is_empty() {
            return Err(AppError::validation("Partial samples were not summarized"));
        }
        for (key, summary) in &report.groups {
            if !(summary.min_elapsed <= summary.avg_elapsed
                && summary.avg_elapsed <= summary.max_elapsed)
            {
                return Err(AppError::validation(format!(
                    "Group {} violates min <= avg <= max",
                    key
                )));
            }
        }
        Ok(())
    })
}

#[test]
fn oversized_width_range_is_rejected_before_dispatch() -> AppResult<()> {
    run_async_test(async {
        let mut args = parse_test_args(["imgbench", "--widths", "1-4294967295", "--no-samples"])?;
        args.template_set = local_templates();

        let (shutdown_tx, _) = shutdown_channel();
        let fetcher = Arc::new(CancellingFetcher::new(1, &shutdown_tx));
        match run_with_fetcher(&args, fetcher.clone(), &shutdown_tx).await {
            Err(AppError::Config(ConfigError::TooManyRequests { max, .. })) if max == MAX_REQUESTS => {}
            other => {
                return Err(AppError::validation(format!(
                    "Expected TooManyRequests, got {:?}",
                    other.map(|report| report.completed)
                )));
            }
        }
        if fetcher.started.load(Ordering::SeqCst) != 0 {
            return Err(AppError::validation("Nothing should be fetched"));
        }
        Ok(())
    })
}

#[test]
fn output_format_inferred_from_extension() -> AppResult<()> {
    let cases = [
        ("report.json", OutputFormat::Json),
        ("report.JSONL", OutputFormat::Jsonl),
        ("report.csv", OutputFormat::Csv),
        ("report.txt", OutputFormat::Text),
        ("report", OutputFormat::Text),
    ];
    for (path, expected) in cases {
        let resolved = resolve_output_format(Some(path), None)?;
        if resolved != Some(expected) {
            return Err(AppError::validation(format!(
                "{} resolved to {:?}",
                path, resolved
            )));
        }
    }
    if resolve_output_format(Some("report.json"), Some(OutputFormat::Csv))?
        != Some(OutputFormat::Csv)
    {
        return Err(AppError::validation("Explicit format must win"));
    }
    match resolve_output_format(None, Some(OutputFormat::Json)) {
        Err(ValidationError::OutputFormatRequiresOutput) => Ok(()),
        other => Err(AppError::validation(format!(
            "Expected OutputFormatRequiresOutput, got {:?}",
            other
        ))),
    }
}

#[test]
fn text_report_lists_groups_failures_and_cancellation() -> AppResult<()> {
    let text = render_report(&sample_report())?;
    for needle in [
        "Completed 3 of 4 requests in 1.50s: 2 samples, 1 failed.",
        "cancelled",
        "Group: cdnA/webp (domain-format)",
        "Avg Total Time: 0.15s",
        "Non-2xx Responses: 1",
        "Min Time: 0.10s",
        "- cdnB/webp: 1 (status=1)",
    ] {
        if !text.contains(needle) {
            return Err(AppError::validation(format!(
                "Report is missing '{}':\n{}",
                needle, text
            )));
        }
    }
    Ok(())
}

#[test]
fn sample_rows_show_metrics_or_error() -> AppResult<()> {
    let sample = SampleOutcome::Sample(SampleResult {
        spec: RequestSpec::new("cdnA", "webp", 800),
        url: "https://x/?w=800".to_owned(),
        status: 200,
        elapsed: Duration::from_millis(250),
        response_bytes: 1024,
    });
    let row = format_sample_row(&sample);
    if !row.contains("0.25s") || !row.contains("4.00 req/s") || !row.contains("4.00 kB/s") {
        return Err(AppError::validation(format!("Unexpected row: {}", row)));
    }

    let failed = SampleOutcome::Failed {
        spec: RequestSpec::new("cdnA", "webp", 801),
        url: "https://x/?w=801".to_owned(),
        error: FetchError::UnexpectedStatus { status: 500 },
    };
    let row = format_sample_row(&failed);
    if !row.contains("error") || !row.contains("500") {
        return Err(AppError::validation(format!("Unexpected row: {}", row)));
    }
    Ok(())
}

#[test]
fn json_exports_parse() -> AppResult<()> {
    let report = sample_report();

    let json: serde_json::Value = serde_json::from_slice(&report_json(&report)?)?;
    let group = json
        .pointer("/report/groups/cdnA~1webp/count")
        .and_then(serde_json::Value::as_u64);
    if group != Some(2) || json.get("generated_at").is_none() {
        return Err(AppError::validation(format!("Unexpected JSON: {}", json)));
    }
    if json.pointer("/report/duration_ms").and_then(serde_json::Value::as_u64) != Some(1500) {
        return Err(AppError::validation("Missing duration_ms"));
    }

    let jsonl = report_jsonl(&report)?;
    let lines: Vec<serde_json::Value> = jsonl
        .split(|byte| *byte == b'\n')
        .filter(|line| !line.is_empty())
        .map(serde_json::from_slice)
        .collect::<Result<_, _>>()?;
    let kinds: Vec<&str> = lines
        .iter()
        .filter_map(|line| line.get("type").and_then(serde_json::Value::as_str))
        .collect();
    if kinds != ["run", "group", "failures"] {
        return Err(AppError::validation(format!("Unexpected JSONL: {:?}", kinds)));
    }
    Ok(())
}

#[test]
fn csv_export_has_one_row_per_group() -> AppResult<()> {
    let csv = report_csv(&sample_report());
    let lines: Vec<&str> = csv.lines().collect();
    if lines.len() != 3 {
        return Err(AppError::validation(format!("Unexpected CSV:\n{}", csv)));
    }
    let first = lines.get(1).copied().unwrap_or_default();
    if !first.starts_with("cdnA/webp,2,0.150000,") || !first.ends_with(",1,0") {
        return Err(AppError::validation(format!("Unexpected row: {}", first)));
    }
    let failure_only = lines.get(2).copied().unwrap_or_default();
    if !failure_only.starts_with("cdnB/webp,0,") || !failure_only.ends_with(",1") {
        return Err(AppError::validation(format!("Unexpected row: {}", failure_only)));
    }
    Ok(())
}

#[test]
fn export_report_writes_file() -> AppResult<()> {
    run_async_test(async {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("report.json");
        let path_str = path
            .to_str()
            .ok_or_else(|| AppError::validation("Non UTF-8 temp path"))?;
        export_report(path_str, OutputFormat::Json, &sample_report()).await?;

        let content = std::fs::read(&path)?;
        let json: serde_json::Value = serde_json::from_slice(&content)?;
        if json.pointer("/report/planned").and_then(serde_json::Value::as_u64) != Some(4) {
            return Err(AppError::validation("Exported report is incomplete"));
        }
        Ok(())
    })
}
