//! The `qbank modules` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use super::open_bank;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let (_, bank) = open_bank(config_path.as_deref())?;

    let mut table = Table::new();
    table.set_header(vec!["Module", "Name", "Default type", "Topics", "Questions"]);
    for module in bank.catalog().modules() {
        let topics = bank.list_topics(&module.id).await?;
        let questions = bank.questions(&module.id, None).await?;
        table.add_row(vec![
            module.id.clone(),
            module.name.clone(),
            qbank_core::model::QuestionType::from(module.shape).to_string(),
            topics.len().to_string(),
            questions.len().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
