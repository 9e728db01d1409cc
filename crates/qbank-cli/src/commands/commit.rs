//! The `qbank commit` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use qbank_core::sampler::SelectionResult;

use super::open_bank;
use super::usage::print_usage;

pub async fn execute(
    selection_path: PathBuf,
    batch: String,
    course: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (_, bank) = open_bank(config_path.as_deref())?;

    let content = std::fs::read_to_string(&selection_path)
        .with_context(|| format!("failed to read selection: {}", selection_path.display()))?;
    let selection: SelectionResult = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse selection: {}", selection_path.display()))?;

    let records = bank.commit_assembly(&selection, &batch, &course).await?;
    println!(
        "Committed {} question(s) for batch {batch}, course {course}",
        selection.len()
    );
    if !records.is_empty() {
        print_usage(&bank, &records).await?;
    }
    Ok(())
}
