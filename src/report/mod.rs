//! Plain-text rendering of verification results.

use crate::checks;
use crate::models::Verdict;
use crate::pipeline::PipelineReport;

/// Per-device sections with one line per check, followed by a trailing
/// overall summary.
pub fn render_verification(title: &str, report: &PipelineReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n=== {} ===\n\n", title));

    for device in &report.devices {
        out.push_str(&format!("--- Device {} ---\n", device.host));
        if !device.connected {
            out.push_str(&format!(
                "Connection failed: {}\n\n",
                device.connect_error.as_deref().unwrap_or("unknown error")
            ));
            continue;
        }
        for result in &device.results {
            out.push_str(&format!("{}: {}\n", result.check_name, result.verdict));
        }
        out.push('\n');
    }

    out.push_str(&format!("=== End of {} ===\n\n", title));
    out.push_str(if report.all_passed() {
        "Overall: PASS\n"
    } else {
        "Overall: FAIL\n"
    });
    out
}

/// Rows for the ssh-check table: Host, Username, SSH Status, Ping <target>.
pub fn ssh_check_rows(report: &PipelineReport) -> Vec<Vec<String>> {
    report
        .devices
        .iter()
        .map(|device| {
            let ssh_status = if device.connected {
                "SSH OK".to_string()
            } else {
                device
                    .connect_error
                    .clone()
                    .unwrap_or_else(|| "Connection failed".to_string())
            };

            let ping_status = if !device.connected {
                "N/A".to_string()
            } else {
                device
                    .results
                    .iter()
                    .find(|r| r.check_name == checks::MGMT_REACHABILITY)
                    .map(|r| match r.verdict {
                        Verdict::Pass => "Reachable".to_string(),
                        Verdict::Fail => "Unreachable".to_string(),
                        Verdict::Error => format!("Ping Error: {}", r.detail),
                    })
                    .unwrap_or_else(|| "N/A".to_string())
            };

            vec![
                device.host.clone(),
                device.username.clone(),
                ssh_status,
                ping_status,
            ]
        })
        .collect()
}

/// Fixed-width ASCII table with a header rule.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().take(columns).enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let render_row = |cells: &[String]| -> String {
        let mut line = String::from("|");
        for (i, width) in widths.iter().copied().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            line.push_str(&format!(" {:<width$} |", cell, width = width));
        }
        line.push('\n');
        line
    };

    let rule: String = {
        let mut line = String::from("+");
        for width in &widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line.push('\n');
        line
    };

    let mut out = String::new();
    out.push_str(&rule);
    out.push_str(&render_row(headers));
    out.push_str(&rule);
    for row in rows {
        out.push_str(&render_row(row));
    }
    out.push_str(&rule);
    out
}
