//! The `qbank usage` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;
use uuid::Uuid;

use qbank_core::usage::{UsageLevel, UsageRecord};
use qbank_core::QuestionBank;

use super::open_bank;

pub async fn execute(
    topic: Option<Uuid>,
    module: Option<String>,
    batch: String,
    course: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (_, bank) = open_bank(config_path.as_deref())?;

    let topic_ids: Vec<Uuid> = match (topic, module) {
        (Some(id), _) => vec![id],
        (None, Some(module)) => bank
            .list_topics(&module)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect(),
        (None, None) => anyhow::bail!("pass --topic or --module"),
    };

    let mut records = Vec::with_capacity(topic_ids.len());
    for id in topic_ids {
        records.push(bank.topic_usage(id, &batch, &course).await?);
    }
    if records.is_empty() {
        println!("No topics to report.");
        return Ok(());
    }
    print_usage(&bank, &records).await
}

/// Print usage records as a table, with topic names resolved.
pub async fn print_usage(bank: &QuestionBank, records: &[UsageRecord]) -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Topic", "Used", "Total", "Usage", "Level"]);
    for r in records {
        let name = bank
            .store()
            .topic(r.topic_id)
            .await?
            .map(|t| t.name)
            .unwrap_or_else(|| r.topic_id.to_string());
        let level = match r.level {
            UsageLevel::Available => "available",
            UsageLevel::NearingExhaustion => "nearing exhaustion",
            UsageLevel::FullyUsed => "fully used",
        };
        table.add_row(vec![
            name,
            r.used_questions.to_string(),
            r.total_questions.to_string(),
            format!("{:.1}%", r.percentage),
            level.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
