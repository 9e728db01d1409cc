//! The `qbank assemble` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use qbank_core::model::QuestionBody;
use qbank_core::sampler::SelectionResult;

use super::{emit, open_bank};

pub async fn execute(
    module: String,
    topic: Option<Uuid>,
    count: Option<usize>,
    output: Option<PathBuf>,
    seed: Option<u64>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, bank) = open_bank(config_path.as_deref())?;
    let count = count.unwrap_or(config.default_question_count);

    let selection = match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            bank.preview_assembly_with_rng(&module, topic, count, &mut rng)
                .await?
        }
        None => bank.preview_assembly(&module, topic, count).await?,
    };

    print_selection(&selection);

    let json = serde_json::to_string_pretty(&selection).context("failed to serialize selection")?;
    emit(&format!("{json}\n"), output.as_ref())?;
    eprintln!(
        "Preview only. Run `qbank commit --selection <file> --batch <id> --course <id>` to record usage."
    );
    Ok(())
}

fn print_selection(selection: &SelectionResult) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Answer", "Usage", "Status"]);
    for (i, item) in selection.items.iter().enumerate() {
        let answer = match &item.question.body {
            QuestionBody::Mcq(mcq) => format!("{}: {}", mcq.answer, mcq.options.get(mcq.answer)),
            QuestionBody::Coding(c) => format!("{} test case(s)", c.test_cases.len()),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(item.question.text()),
            Cell::new(answer),
            Cell::new(item.current_usage),
            Cell::new(item.repetition_status),
        ]);
    }
    eprintln!("{table}");
}
