//! The `qbank topic` commands.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use super::open_bank;
use crate::TopicCommand;

pub async fn execute(action: TopicCommand, config_path: Option<PathBuf>) -> Result<()> {
    let (_, bank) = open_bank(config_path.as_deref())?;

    match action {
        TopicCommand::Create { module, name } => {
            let topic = bank.create_topic(&module, &name).await?;
            println!(
                "Created topic '{}' in {}: {}",
                topic.name, topic.module_id, topic.id
            );
        }
        TopicCommand::Rename { id, name } => {
            let topic = bank.rename_topic(id, &name).await?;
            println!("Topic {} is now '{}'", topic.id, topic.name);
        }
        TopicCommand::Delete { id, yes } => {
            let questions = bank.topic_questions(id).await?;
            if !yes {
                anyhow::bail!(
                    "deleting topic {id} also deletes its {} question(s); re-run with --yes to confirm",
                    questions.len()
                );
            }
            let deleted = bank.delete_topic(id).await?;
            println!("Deleted topic {id} and {deleted} question(s)");
        }
        TopicCommand::List { module } => {
            let topics = bank.list_topics(&module).await?;
            if topics.is_empty() {
                println!("No topics in {module}. Create one with `qbank topic create`.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["Id", "Name", "Questions", "Used", "Created"]);
            for t in &topics {
                table.add_row(vec![
                    t.id.to_string(),
                    t.name.clone(),
                    t.total_questions.to_string(),
                    t.used_questions.to_string(),
                    t.created_at.format("%Y-%m-%d").to_string(),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(())
}
