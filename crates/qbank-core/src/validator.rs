//! Structural validation and duplicate detection.
//!
//! Duplicates are exact matches on question text after case folding and
//! whitespace collapsing. This is deliberately not a fuzzy match.

use std::collections::HashMap;

use uuid::Uuid;

use crate::model::{Question, QuestionBody};
use crate::normalizer::NormalizedRecord;
use crate::report::RowIssue;

/// Key used to compare question texts.
pub fn dedup_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Check the structural invariants of a question body.
pub fn check_body(body: &QuestionBody) -> Result<(), String> {
    match body {
        QuestionBody::Mcq(mcq) => {
            let missing: Vec<&str> = [
                ("Question", mcq.question.as_str()),
                ("A", mcq.options.a.as_str()),
                ("B", mcq.options.b.as_str()),
                ("C", mcq.options.c.as_str()),
                ("D", mcq.options.d.as_str()),
            ]
            .into_iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| name)
            .collect();
            if !missing.is_empty() {
                return Err(format!("missing field(s): {}", missing.join(", ")));
            }
            Ok(())
        }
        QuestionBody::Coding(coding) => {
            let missing: Vec<&str> = [
                ("QuestionTitle", coding.title.as_str()),
                ("ProblemStatement", coding.statement.as_str()),
                ("Language", coding.language.as_str()),
            ]
            .into_iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| name)
            .collect();
            if !missing.is_empty() {
                return Err(format!("missing field(s): {}", missing.join(", ")));
            }
            if coding.test_cases.is_empty() {
                return Err("coding question has no test cases".to_string());
            }
            if let Some(pos) = coding.test_cases.iter().position(|tc| tc.points == 0) {
                return Err(format!("test case {} has 0 points", pos + 1));
            }
            Ok(())
        }
    }
}

/// Where an already-seen question text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeenAt {
    /// An earlier row of the same upload.
    Row(usize),
    /// A question already in the store.
    Stored(Uuid),
}

impl SeenAt {
    pub fn describe(self) -> String {
        match self {
            SeenAt::Row(row) => format!("duplicate of row {row} in this upload"),
            SeenAt::Stored(id) => format!("duplicate of existing question {id}"),
        }
    }
}

/// The three disjoint buckets a batch is partitioned into.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    pub valid: Vec<NormalizedRecord>,
    pub duplicates: Vec<RowIssue>,
    pub invalid: Vec<RowIssue>,
}

/// Tracks question texts seen so far; first-seen wins.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    seen: HashMap<String, SeenAt>,
}

impl Deduplicator {
    /// Seed with the questions already stored in the target scope.
    pub fn with_existing<'a>(existing: impl IntoIterator<Item = &'a Question>) -> Self {
        let mut dedup = Self::default();
        for q in existing {
            dedup
                .seen
                .entry(dedup_key(&q.text()))
                .or_insert(SeenAt::Stored(q.id));
        }
        dedup
    }

    /// Where `text` was seen before, if anywhere.
    pub fn lookup(&self, text: &str) -> Option<SeenAt> {
        self.seen.get(&dedup_key(text)).copied()
    }

    /// Record `text` as seen at `at` unless already seen; returns the earlier
    /// sighting when there is one.
    pub fn observe(&mut self, text: &str, at: SeenAt) -> Option<SeenAt> {
        let key = dedup_key(text);
        match self.seen.get(&key) {
            Some(earlier) => Some(*earlier),
            None => {
                self.seen.insert(key, at);
                None
            }
        }
    }
}

/// Partition `records` into valid, duplicate and invalid buckets.
///
/// `existing` is the stored question corpus of the target module (narrowed to
/// the target topic when one is selected). Every record is processed even if
/// earlier ones fail.
pub fn validate(records: Vec<NormalizedRecord>, existing: &[Question]) -> Validation {
    let mut dedup = Deduplicator::with_existing(existing);
    let mut out = Validation::default();

    for record in records {
        let text = record.body.text();
        if let Err(reason) = check_body(&record.body) {
            out.invalid.push(RowIssue {
                row: record.row,
                text,
                reason,
            });
            continue;
        }
        if let Some(earlier) = dedup.observe(&text, SeenAt::Row(record.row)) {
            tracing::debug!(row = record.row, ?earlier, "duplicate row");
            out.duplicates.push(RowIssue {
                row: record.row,
                text,
                reason: earlier.describe(),
            });
            continue;
        }
        out.valid.push(record);
    }

    out
}
