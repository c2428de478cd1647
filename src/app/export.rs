use std::path::Path;

use tokio::io::{AsyncWriteExt, BufWriter};

use crate::args::OutputFormat;
use crate::error::{SinkError, ValidationError};
use crate::metrics::{GroupKey, MetricsReport, Summary};

use super::summary::render_report;

/// Picks the report file format: the explicit flag, else the `--output`
/// extension, else plain text.
///
/// # Errors
///
/// Returns [`ValidationError::OutputFormatRequiresOutput`] when a format is
/// given without a path.
pub(crate) fn resolve_output_format(
    output: Option<&str>,
    format: Option<OutputFormat>,
) -> Result<Option<OutputFormat>, ValidationError> {
    match (output, format) {
        (None, Some(_)) => Err(ValidationError::OutputFormatRequiresOutput),
        (None, None) => Ok(None),
        (Some(_), Some(format)) => Ok(Some(format)),
        (Some(path), None) => {
            let extension = Path::new(path)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase);
            let format = match extension.as_deref() {
                Some("json") => OutputFormat::Json,
                Some("jsonl" | "ndjson") => OutputFormat::Jsonl,
                Some("csv") => OutputFormat::Csv,
                _ => OutputFormat::Text,
            };
            Ok(Some(format))
        }
    }
}

/// Writes the finished report to `path`.
///
/// # Errors
///
/// Returns an error when serialization or the file write fails.
pub(crate) async fn export_report(
    path: &str,
    format: OutputFormat,
    report: &MetricsReport,
) -> Result<(), SinkError> {
    let payload = match format {
        OutputFormat::Text => render_report(report)?.into_bytes(),
        OutputFormat::Json => report_json(report)?,
        OutputFormat::Jsonl => report_jsonl(report)?,
        OutputFormat::Csv => report_csv(report).into_bytes(),
    };
    write_file(path, &payload)
        .await
        .map_err(|err| SinkError::WriteReport {
            path: path.into(),
            source: err,
        })
}

async fn write_file(path: &str, payload: &[u8]) -> Result<(), std::io::Error> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

pub(crate) fn report_json(report: &MetricsReport) -> Result<Vec<u8>, SinkError> {
    let payload = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "report": report,
    });
    serde_json::to_vec_pretty(&payload).map_err(|err| SinkError::Serialize { source: err })
}

pub(crate) fn report_jsonl(report: &MetricsReport) -> Result<Vec<u8>, SinkError> {
    let mut lines = Vec::with_capacity(report.groups.len().saturating_add(1));
    lines.push(serde_json::json!({
        "type": "run",
        "group_by": report.group_by,
        "planned": report.planned,
        "completed": report.completed,
        "failed": report.failed,
        "cancelled": report.cancelled,
        "duration_ms": u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
    }));
    for (key, summary) in &report.groups {
        lines.push(serde_json::json!({
            "type": "group",
            "group": key,
            "summary": summary,
        }));
    }
    for (key, tally) in &report.failures {
        lines.push(serde_json::json!({
            "type": "failures",
            "group": key,
            "count": tally.count,
            "by_kind": tally.by_kind,
        }));
    }

    let mut out = Vec::new();
    for line in lines {
        let bytes = serde_json::to_vec(&line).map_err(|err| SinkError::Serialize { source: err })?;
        out.extend_from_slice(&bytes);
        out.push(b'\n');
    }
    Ok(out)
}

const CSV_HEADER: &str = "group,count,avg_elapsed_s,avg_req_per_second,avg_time_per_request_ms,avg_transfer_rate_kbps,avg_response_bytes,min_elapsed_s,max_elapsed_s,non_success,failed\n";

#[must_use]
pub(crate) fn report_csv(report: &MetricsReport) -> String {
    let mut rows = vec![CSV_HEADER.to_owned()];
    for (key, summary) in &report.groups {
        rows.push(csv_row(key, summary, failed_in(report, key)));
    }
    for (key, tally) in &report.failures {
        if !report.groups.contains_key(key) {
            rows.push(format!(
                "{},0,,,,,,,,0,{}\n",
                csv_field(&key.to_string()),
                tally.count
            ));
        }
    }
    rows.concat()
}

fn failed_in(report: &MetricsReport, key: &GroupKey) -> u64 {
    report.failures.get(key).map_or(0, |tally| tally.count)
}

fn csv_row(key: &GroupKey, summary: &Summary, failed: u64) -> String {
    format!(
        "{},{},{:.6},{:.6},{:.3},{:.3},{:.1},{:.6},{:.6},{},{}\n",
        csv_field(&key.to_string()),
        summary.count,
        summary.avg_elapsed,
        summary.avg_req_per_second,
        summary.avg_time_per_request_ms,
        summary.avg_transfer_rate_kbps,
        summary.avg_response_bytes,
        summary.min_elapsed,
        summary.max_elapsed,
        summary.non_success,
        failed
    )
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}
