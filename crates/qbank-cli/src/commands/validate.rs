//! The `qbank validate` command.

use std::path::PathBuf;

use anyhow::Result;

use super::ingest::{build_request, print_report};
use super::open_bank;
use crate::UploadArgs;

pub async fn execute(upload: UploadArgs, config_path: Option<PathBuf>) -> Result<()> {
    let (_, bank) = open_bank(config_path.as_deref())?;
    let request = build_request(&bank, upload, true)?;
    let report = bank.ingest(request).await?;

    print_report(&report);
    if report.duplicate_count() == 0 && report.invalid_count() == 0 {
        println!("All rows valid.");
    } else {
        println!(
            "\n{} row(s) would be skipped.",
            report.duplicate_count() + report.invalid_count()
        );
    }
    Ok(())
}
