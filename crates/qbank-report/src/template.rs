//! CSV templates and question exports.
//!
//! Both use the same column layout the ingester reads, so an export can be
//! uploaded again as-is.

use std::path::Path;

use anyhow::{Context, Result};

use qbank_core::model::{CodingQuestion, McqQuestion, Question, QuestionBody, QuestionShape};

const MCQ_HEADER: [&str; 6] = ["Question", "A", "B", "C", "D", "Answer"];
const CODING_PREFIX: [&str; 3] = ["QuestionTitle", "ProblemStatement", "Language"];
const TEST_CASE_FIELDS: [&str; 5] = ["Input", "Output", "Points", "ResponseTime", "IsSample"];

fn coding_header(test_cases: usize) -> Vec<String> {
    let mut header: Vec<String> = CODING_PREFIX.iter().map(|s| s.to_string()).collect();
    for n in 1..=test_cases {
        header.extend(TEST_CASE_FIELDS.iter().map(|f| format!("TestCase{n}{f}")));
    }
    header
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// An MCQ upload template with one example row.
pub fn mcq_template() -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(MCQ_HEADER)?;
    writer.write_record([
        "Choose the correct past tense of 'run'",
        "runned",
        "ran",
        "running",
        "runs",
        "B",
    ])?;
    finish(writer)
}

/// A coding upload template with `test_cases` test case column groups.
pub fn coding_template(test_cases: usize) -> Result<String> {
    let test_cases = test_cases.max(1);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(coding_header(test_cases))?;

    let mut example = vec![
        "Perfect number".to_string(),
        "Read n and print whether it is a perfect number".to_string(),
        qbank_core::model::DEFAULT_LANGUAGE.to_string(),
    ];
    let samples = [
        ("6", "6 is a perfect number"),
        ("15", "15 is not a perfect number"),
    ];
    for n in 0..test_cases {
        let (input, output) = samples[n % samples.len()];
        example.extend([
            input.to_string(),
            output.to_string(),
            "1".to_string(),
            String::new(),
            (n == 0).to_string(),
        ]);
    }
    writer.write_record(&example)?;
    finish(writer)
}

fn mcq_record(mcq: &McqQuestion) -> [String; 6] {
    [
        mcq.question.clone(),
        mcq.options.a.clone(),
        mcq.options.b.clone(),
        mcq.options.c.clone(),
        mcq.options.d.clone(),
        mcq.answer.to_string(),
    ]
}

fn coding_record(coding: &CodingQuestion, width: usize) -> Vec<String> {
    let mut record = vec![
        coding.title.clone(),
        coding.statement.clone(),
        coding.language.clone(),
    ];
    for tc in &coding.test_cases {
        record.extend([
            tc.input.clone(),
            tc.expected_output.clone(),
            tc.points.to_string(),
            tc.response_time_ms.map(|ms| ms.to_string()).unwrap_or_default(),
            tc.is_sample.to_string(),
        ]);
    }
    // Pad so every record has as many fields as the header.
    record.resize(CODING_PREFIX.len() + width * TEST_CASE_FIELDS.len(), String::new());
    record
}

/// Export the questions of one shape in the template layout.
///
/// Questions of the other shape are skipped. Coding exports get as many
/// test case column groups as the question with the most test cases.
pub fn export_questions<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
    shape: QuestionShape,
) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    match shape {
        QuestionShape::Mcq => {
            writer.write_record(MCQ_HEADER)?;
            for q in questions {
                if let QuestionBody::Mcq(mcq) = &q.body {
                    writer.write_record(mcq_record(mcq))?;
                }
            }
        }
        QuestionShape::Coding => {
            let coding: Vec<&CodingQuestion> = questions
                .into_iter()
                .filter_map(|q| match &q.body {
                    QuestionBody::Coding(c) => Some(c),
                    QuestionBody::Mcq(_) => None,
                })
                .collect();
            let width = coding
                .iter()
                .map(|c| c.test_cases.len())
                .max()
                .unwrap_or(0)
                .max(1);
            writer.write_record(coding_header(width))?;
            for c in coding {
                writer.write_record(coding_record(c, width))?;
            }
        }
    }
    finish(writer)
}

/// Write CSV text to a file, creating parent directories.
pub fn write_csv(contents: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write CSV to {}", path.display()))?;
    Ok(())
}
