//! The `qbank export` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use uuid::Uuid;

use qbank_core::model::QuestionType;
use qbank_report::export_questions;

use super::{emit, open_bank};

pub async fn execute(
    module: String,
    topic: Option<Uuid>,
    question_type: Option<QuestionType>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (_, bank) = open_bank(config_path.as_deref())?;
    let shape = match question_type {
        Some(qt) => qt.shape(),
        None => bank
            .catalog()
            .get(&module)
            .map(|m| m.shape)
            .with_context(|| format!("unknown module: {module}"))?,
    };

    let questions = bank.questions(&module, topic).await?;
    let csv = export_questions(&questions, shape)?;
    let exported = questions.iter().filter(|q| q.shape() == shape).count();
    emit(&csv, output.as_ref())?;
    eprintln!("Exported {exported} question(s)");
    Ok(())
}
