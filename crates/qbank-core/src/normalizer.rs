//! Record normalizer.
//!
//! Maps decoded rows onto one of the two canonical question shapes. The shape
//! is chosen by the caller's `QuestionType`, never by sniffing columns.
//!
//! Coding rows use the "wide format": test case `n` lives in the columns
//! `TestCase{n}Input`, `TestCase{n}Output`, `TestCase{n}Points`,
//! `TestCase{n}ResponseTime` and `TestCase{n}IsSample`. The scan starts at
//! `n = 1` and stops at the first `n` whose Input *and* Output are both
//! missing or empty. A gap therefore truncates the list silently: a row with
//! test cases 1, 2 and 4 yields two test cases. Template authors should keep
//! test case columns contiguous.

use crate::decoder::RawRow;
use crate::model::{
    AnswerKey, CodingQuestion, McqOptions, McqQuestion, QuestionBody, QuestionType, TestCase,
    DEFAULT_LANGUAGE,
};
use crate::report::RowIssue;

pub const QUESTION_ALIASES: &[&str] = &["Question"];
pub const OPTION_A_ALIASES: &[&str] = &["A", "OptionA"];
pub const OPTION_B_ALIASES: &[&str] = &["B", "OptionB"];
pub const OPTION_C_ALIASES: &[&str] = &["C", "OptionC"];
pub const OPTION_D_ALIASES: &[&str] = &["D", "OptionD"];
pub const ANSWER_ALIASES: &[&str] = &["Answer"];
pub const TITLE_ALIASES: &[&str] = &["QuestionTitle", "Title"];
pub const STATEMENT_ALIASES: &[&str] = &["ProblemStatement", "Statement"];
pub const LANGUAGE_ALIASES: &[&str] = &["Language"];

/// A row that normalized into a canonical question body.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    /// 1-based row position in the source file.
    pub row: usize,
    pub body: QuestionBody,
}

/// Output of [`normalize`]: every input row ends up in exactly one list.
#[derive(Debug, Clone, Default)]
pub struct Normalization {
    pub records: Vec<NormalizedRecord>,
    pub rejected: Vec<RowIssue>,
}

/// Normalize every row for the given question type.
pub fn normalize(rows: &[RawRow], question_type: QuestionType) -> Normalization {
    let mut out = Normalization::default();
    for row in rows {
        let result = match question_type {
            QuestionType::Mcq => normalize_mcq(row).map(QuestionBody::Mcq),
            QuestionType::Compiler => normalize_coding(row).map(QuestionBody::Coding),
        };
        match result {
            Ok(body) => out.records.push(NormalizedRecord {
                row: row.index,
                body,
            }),
            Err(reason) => {
                tracing::debug!(row = row.index, %reason, "row rejected during normalization");
                out.rejected.push(RowIssue {
                    row: row.index,
                    text: preview_text(row, question_type),
                    reason,
                });
            }
        }
    }
    out
}

fn preview_text(row: &RawRow, question_type: QuestionType) -> String {
    match question_type {
        QuestionType::Mcq => row.get_or_empty(QUESTION_ALIASES).to_string(),
        QuestionType::Compiler => row.get_or_empty(TITLE_ALIASES).to_string(),
    }
}

/// Normalize one MCQ row, upper-casing the answer key.
pub fn normalize_mcq(row: &RawRow) -> Result<McqQuestion, String> {
    let fields = [
        ("Question", row.get(QUESTION_ALIASES)),
        ("A", row.get(OPTION_A_ALIASES)),
        ("B", row.get(OPTION_B_ALIASES)),
        ("C", row.get(OPTION_C_ALIASES)),
        ("D", row.get(OPTION_D_ALIASES)),
        ("Answer", row.get(ANSWER_ALIASES)),
    ];
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(missing_fields(&missing));
    }

    let value = |i: usize| fields[i].1.unwrap_or_default().to_string();
    let answer: AnswerKey = value(5).parse()?;

    Ok(McqQuestion {
        question: value(0),
        options: McqOptions {
            a: value(1),
            b: value(2),
            c: value(3),
            d: value(4),
        },
        answer,
    })
}

/// Normalize one wide-format coding row.
pub fn normalize_coding(row: &RawRow) -> Result<CodingQuestion, String> {
    let title = row.get(TITLE_ALIASES);
    let statement = row.get(STATEMENT_ALIASES);

    let mut missing = Vec::new();
    if title.is_none() {
        missing.push("QuestionTitle");
    }
    if statement.is_none() {
        missing.push("ProblemStatement");
    }
    if !missing.is_empty() {
        return Err(missing_fields(&missing));
    }

    let test_cases = extract_test_cases(row);
    if test_cases.is_empty() {
        return Err(
            "missing field(s): TestCase1Input, TestCase1Output (no test cases found)".to_string(),
        );
    }

    Ok(CodingQuestion {
        title: title.unwrap_or_default().to_string(),
        statement: statement.unwrap_or_default().to_string(),
        language: row
            .get(LANGUAGE_ALIASES)
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string(),
        test_cases,
    })
}

/// Reconstruct the test cases of a wide-format row, stopping at the first gap.
///
/// A group counts as missing only when both its input and output are empty.
/// Anything after a missing group is silently ignored, so an upload with
/// `TestCase1*` and `TestCase3*` columns yields one test case.
pub fn extract_test_cases(row: &RawRow) -> Vec<TestCase> {
    let mut cases = Vec::new();
    for n in 1.. {
        let column = |suffix: &str| format!("TestCase{n}{suffix}");
        let input = row.get(&[column("Input").as_str()]);
        let output = row.get(&[column("Output").as_str()]);
        if input.is_none() && output.is_none() {
            break;
        }

        cases.push(TestCase {
            input: input.unwrap_or_default().to_string(),
            expected_output: output.unwrap_or_default().to_string(),
            points: parse_points(row.get(&[column("Points").as_str()])),
            response_time_ms: row
                .get(&[column("ResponseTime").as_str()])
                .and_then(|v| v.parse::<u64>().ok()),
            is_sample: row.get(&[column("IsSample").as_str()]) == Some("true"),
        });
    }
    cases
}

fn parse_points(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.parse::<u32>().ok())
        .filter(|&p| p >= 1)
        .unwrap_or(1)
}

fn missing_fields(names: &[&str]) -> String {
    format!("missing field(s): {}", names.join(", "))
}
