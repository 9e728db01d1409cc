//! The `qbank ingest` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use qbank_core::decoder::TabularFormat;
use qbank_core::model::QuestionType;
use qbank_core::report::UploadBatchReport;
use qbank_core::{IngestRequest, QuestionBank};
use qbank_report::write_html_report;

use super::open_bank;
use crate::UploadArgs;

pub async fn execute(
    upload: UploadArgs,
    dry_run: bool,
    report_format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, bank) = open_bank(config_path.as_deref())?;
    let request = build_request(&bank, upload, dry_run)?;
    let report = bank.ingest(request).await?;

    print_report(&report);

    let formats: Vec<&str> = match report_format.as_str() {
        "all" => vec!["json", "html", "markdown"],
        "none" => vec![],
        other => other.split(',').map(str::trim).collect(),
    };
    if formats.is_empty() {
        return Ok(());
    }

    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");
    let short_id = report.id.simple().to_string();
    let stem = format!(
        "upload-{}-{timestamp}-{}",
        report.module_id.to_lowercase(),
        &short_id[..8]
    );
    for fmt in formats {
        match fmt {
            "json" => {
                let path = config.report_dir.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            "html" => {
                let path = config.report_dir.join(format!("{stem}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "markdown" => {
                let path = config.report_dir.join(format!("{stem}.md"));
                std::fs::create_dir_all(&config.report_dir)?;
                std::fs::write(&path, report.to_markdown())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => eprintln!("Unknown report format: {fmt}"),
        }
    }

    Ok(())
}

/// Read the upload file and resolve the defaults for type and format.
pub fn build_request(
    bank: &QuestionBank,
    upload: UploadArgs,
    dry_run: bool,
) -> Result<IngestRequest> {
    let format = match upload.format {
        Some(format) => format,
        None => upload
            .file
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(TabularFormat::from_extension)
            .with_context(|| {
                format!(
                    "cannot tell the format of {}; pass --format csv|xlsx",
                    upload.file.display()
                )
            })?,
    };

    let question_type = match upload.question_type {
        Some(qt) => qt,
        None => bank
            .catalog()
            .get(&upload.module)
            .map(|m| QuestionType::from(m.shape))
            .with_context(|| format!("unknown module: {}", upload.module))?,
    };

    let bytes = std::fs::read(&upload.file)
        .with_context(|| format!("failed to read {}", upload.file.display()))?;

    Ok(IngestRequest {
        bytes,
        format,
        module_id: upload.module,
        topic_id: upload.topic,
        question_type,
        dry_run,
    })
}

/// Print the summary line and every rejected row.
pub fn print_report(report: &UploadBatchReport) {
    let suffix = if report.dry_run { " (dry run)" } else { "" };
    println!(
        "{} {}: {}{suffix}",
        report.module_id,
        report.question_type,
        report.summary_line()
    );

    if report.duplicates.is_empty() && report.invalid.is_empty() {
        return;
    }

    let mut issues: Vec<(&str, &qbank_core::report::RowIssue)> = report
        .duplicates
        .iter()
        .map(|i| ("duplicate", i))
        .chain(report.invalid.iter().map(|i| ("invalid", i)))
        .collect();
    issues.sort_by_key(|(_, issue)| issue.row);

    let mut table = Table::new();
    table.set_header(vec!["Row", "Status", "Question", "Reason"]);
    for (status, issue) in issues {
        table.add_row(vec![
            Cell::new(issue.row),
            Cell::new(status),
            Cell::new(truncate(&issue.text, 60)),
            Cell::new(&issue.reason),
        ]);
    }
    println!("{table}");
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
