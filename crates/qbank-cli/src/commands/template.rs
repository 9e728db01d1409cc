//! The `qbank template` command.

use std::path::PathBuf;

use anyhow::Result;

use qbank_core::model::QuestionType;
use qbank_report::{coding_template, mcq_template};

use super::emit;

pub fn execute(
    question_type: QuestionType,
    test_cases: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(test_cases >= 1, "test-cases must be at least 1");
    let csv = match question_type {
        QuestionType::Mcq => mcq_template()?,
        QuestionType::Compiler => coding_template(test_cases)?,
    };
    emit(&csv, output.as_ref())
}
