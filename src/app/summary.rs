use std::fmt::Write as _;

use crate::error::SinkError;
use crate::metrics::{MetricsReport, SampleOutcome, Summary};

const URL_COLUMN_WIDTH: usize = 40;

#[must_use]
pub(crate) fn sample_table_header() -> String {
    format!(
        "{:<width$} {:<8} {:<12} {:<12} {:<12} {:<12}\n{}",
        "URL",
        "Status",
        "Total Time",
        "Req/s",
        "Time/Req",
        "Transfer",
        "-".repeat(URL_COLUMN_WIDTH.saturating_add(60)),
        width = URL_COLUMN_WIDTH
    )
}

/// One table row per outcome, in completion order.
#[must_use]
pub(crate) fn format_sample_row(outcome: &SampleOutcome) -> String {
    match outcome {
        SampleOutcome::Sample(sample) => format!(
            "{:<width$} {:<8} {:.2}s {:.2} req/s {:.2} ms {:.2} kB/s",
            sample.url,
            sample.status,
            sample.elapsed_seconds(),
            sample.req_per_second(),
            sample.time_per_request_ms(),
            sample.transfer_rate_kbps(),
            width = URL_COLUMN_WIDTH
        ),
        SampleOutcome::Failed { url, error, .. } => format!(
            "{:<width$} {:<8} {}",
            url,
            "error",
            error,
            width = URL_COLUMN_WIDTH
        ),
    }
}

/// Renders the grouped summaries, failure counts, and run totals.
///
/// # Errors
///
/// Returns [`SinkError::WriteLine`] if formatting fails.
pub(crate) fn render_report(report: &MetricsReport) -> Result<String, SinkError> {
    let mut out = String::new();
    write_report(&mut out, report).map_err(|err| SinkError::WriteLine { source: err })?;
    Ok(out)
}

fn write_report(out: &mut String, report: &MetricsReport) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(
        out,
        "Completed {} of {} requests in {:.2}s: {} samples, {} failed.",
        report.completed,
        report.planned,
        report.duration.as_secs_f64(),
        report.samples(),
        report.failed
    )?;
    if report.cancelled {
        writeln!(out, "Run was cancelled; summaries cover the requests that finished.")?;
    }

    if report.groups.is_empty() {
        writeln!(out, "No samples collected.")?;
    }
    for (key, summary) in &report.groups {
        writeln!(out)?;
        writeln!(out, "Group: {} ({})", key, report.group_by.as_str())?;
        write_summary(out, summary)?;
    }

    if !report.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "Failures:")?;
        for (key, tally) in &report.failures {
            let kinds = tally
                .by_kind
                .iter()
                .map(|(kind, count)| format!("{}={}", kind, count))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "- {}: {} ({})", key, tally.count, kinds)?;
        }
    }
    Ok(())
}

fn write_summary(out: &mut String, summary: &Summary) -> std::fmt::Result {
    writeln!(out, "Samples: {}", summary.count)?;
    if summary.non_success > 0 {
        writeln!(out, "Non-2xx Responses: {}", summary.non_success)?;
    }
    writeln!(out, "Avg Total Time: {:.2}s", summary.avg_elapsed)?;
    writeln!(out, "Avg Req/s: {:.2}", summary.avg_req_per_second)?;
    writeln!(out, "Avg Time per Request: {:.2} ms", summary.avg_time_per_request_ms)?;
    writeln!(out, "Avg Transfer Rate: {:.2} kB/s", summary.avg_transfer_rate_kbps)?;
    writeln!(out, "Avg Image Size: {:.0} bytes", summary.avg_response_bytes)?;
    writeln!(out, "Max Time: {:.2}s", summary.max_elapsed)?;
    writeln!(out, "Min Time: {:.2}s", summary.min_elapsed)
}
