
use std::fs;
use std::process::Output;

use tempfile::tempdir;

use support_single::run_imgbench;
use support_single::spawn_http_server_or_skip;

fn describe(output: &Output) -> String {
    format!(
        "status: {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn e2e_single_cli_basic() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;

    let args = vec![
        "--template".to_owned(),
        format!("local:webp={}/img?w=", url),
        "--widths".to_owned(),
        "1-20".to_owned(),
        "-c".to_owned(),
        "4".to_owned(),
        "--group-by".to_owned(),
        "width".to_owned(),
    ];

    let output = run_imgbench(dir.path(), args)?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("Completed 20 of 20 requests") || !stdout.contains("Group: 20 (width)") {
        return Err(describe(&output));
    }
    if !stdout.contains("/img?w=7") {
        return Err(format!("Missing per-sample row\n{}", describe(&output)));
    }
    Ok(())
}

#[test]
fn e2e_single_json_export() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let report_path = dir.path().join("report.json");

    let args = vec![
        "--template".to_owned(),
        format!("local:webp={}/img?w=", url),
        "--template".to_owned(),
        format!("local:avif={}/img?w=", url),
        "--widths".to_owned(),
        "100-149".to_owned(),
        "-c".to_owned(),
        "8".to_owned(),
        "--group-by".to_owned(),
        "domain-format".to_owned(),
        "--no-samples".to_owned(),
        "--output".to_owned(),
        report_path.to_string_lossy().into_owned(),
    ];

    let output = run_imgbench(dir.path(), args)?;
    if !output.status.success() {
        return Err(describe(&output));
    }

    let content =
        fs::read_to_string(&report_path).map_err(|err| format!("read report failed: {}", err))?;
    let json: serde_json::Value =
        serde_json::from_str(&content).map_err(|err| format!("parse report failed: {}", err))?;
    for group in ["local~1webp", "local~1avif"] {
        let count = json
            .pointer(&format!("/report/groups/{}/count", group))
            .and_then(serde_json::Value::as_u64);
        if count != Some(50) {
            return Err(format!("Group {} has count {:?}\n{}", group, count, content));
        }
        // Body length equals the width, so the mean of 100..=149 is 124.5.
        let avg_bytes = json
            .pointer(&format!("/report/groups/{}/avg_response_bytes", group))
            .and_then(serde_json::Value::as_f64)
            .unwrap_or_default();
        if (avg_bytes - 124.5).abs() > 1e-9 {
            return Err(format!("Group {} averaged {} bytes", group, avg_bytes));
        }
    }
    if json.pointer("/report/cancelled").and_then(serde_json::Value::as_bool) != Some(false) {
        return Err(format!("Report marked cancelled\n{}", content));
    }
    Ok(())
}

#[test]
fn e2e_single_unknown_domain_exits_nonzero() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let output = run_imgbench(dir.path(), ["--domain", "nowhere", "--no-samples"])?;
    if output.status.success() {
        return Err(format!("Expected failure\n{}", describe(&output)));
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.contains("nowhere") {
        return Err(format!("Missing diagnostic\n{}", describe(&output)));
    }
    Ok(())
}

#[test]
fn e2e_single_status_policy_and_strict() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let template = format!("broken:webp={}/missing?w=", url);

    let recorded = run_imgbench(
        dir.path(),
        [
            "--template",
            template.as_str(),
            "--widths",
            "1-5",
            "--strict",
            "--no-samples",
        ],
    )?;
    if !recorded.status.success() {
        return Err(format!("404 should be recorded\n{}", describe(&recorded)));
    }
    if !String::from_utf8_lossy(&recorded.stdout).contains("Non-2xx Responses: 5") {
        return Err(describe(&recorded));
    }

    let failed = run_imgbench(
        dir.path(),
        [
            "--template",
            template.as_str(),
            "--widths",
            "1-5",
            "--status-policy",
            "fail",
            "--strict",
            "--no-samples",
        ],
    )?;
    if failed.status.success() {
        return Err(format!("Expected --strict failure\n{}", describe(&failed)));
    }
    Ok(())
}

#[test]
fn e2e_single_config_file() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config = format!(
        "widths = \"10-14\"\nconcurrency = 2\ngroup_by = \"format\"\nsamples = false\n\n[templates.local]\npng = \"{}/img?w=\"\njpeg = \"{}/img?w=\"\n",
        url, url
    );
    fs::write(dir.path().join("imgbench.toml"), config)
        .map_err(|err| format!("write config failed: {}", err))?;

    let output = run_imgbench(dir.path(), ["--format", "png"])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("Completed 5 of 5 requests") || !stdout.contains("Group: png (format)") {
        return Err(describe(&output));
    }
    if stdout.contains("Group: jpeg") {
        return Err(format!("Format selector ignored\n{}", describe(&output)));
    }
    Ok(())
}

#[test]
fn e2e_single_timeouts_are_tallied_not_sampled() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let report_path = dir.path().join("report.json");

    let args = vec![
        "--template".to_owned(),
        format!("local:webp={}/img?w=", url),
        "--template".to_owned(),
        format!("slow:webp={}/slow?w=", url),
        "--widths".to_owned(),
        "1-3".to_owned(),
        "--timeout".to_owned(),
        "300ms".to_owned(),
        "--group-by".to_owned(),
        "domain".to_owned(),
        "--no-samples".to_owned(),
        "--output".to_owned(),
        report_path.to_string_lossy().into_owned(),
    ];

    let output = run_imgbench(dir.path(), args)?;
    if !output.status.success() {
        return Err(describe(&output));
    }

    let content =
        fs::read_to_string(&report_path).map_err(|err| format!("read report failed: {}", err))?;
    let json: serde_json::Value =
        serde_json::from_str(&content).map_err(|err| format!("parse report failed: {}", err))?;
    let timeouts = json
        .pointer("/report/failures/slow/by_kind/timeout")
        .and_then(serde_json::Value::as_u64);
    if timeouts != Some(3) {
        return Err(format!("Expected 3 timeouts, got {:?}\n{}", timeouts, content));
    }
    if json.pointer("/report/groups/slow").is_some() {
        return Err(format!("Timed out requests produced samples\n{}", content));
    }
    let local = json
        .pointer("/report/groups/local/count")
        .and_then(serde_json::Value::as_u64);
    if local != Some(3) {
        return Err(format!("Group local has count {:?}\n{}", local, content));
    }
    Ok(())
}

#[test]
fn e2e_single_oversized_width_range_exits_nonzero() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let output = run_imgbench(dir.path(), ["--widths", "1-4294967295", "--no-samples"])?;
    if output.status.success() {
        return Err(format!("Expected failure\n{}", describe(&output)));
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.contains("the limit is 1000000") {
        return Err(format!("Missing diagnostic\n{}", describe(&output)));
    }
    Ok(())
}
