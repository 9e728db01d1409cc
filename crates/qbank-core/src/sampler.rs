//! Assembly sampler.
//!
//! Draws `count` distinct questions from a candidate pool with a uniform
//! random permutation and classifies each by how often it has been used.
//! Sampling never mutates usage; that happens on commit.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QbankError;
use crate::model::Question;

/// How many times a question has been used before, as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RepetitionStatus {
    /// Never used before.
    FirstTime,
    /// Used `prior_uses` (≥ 1) times before.
    Repeating { prior_uses: u32 },
}

impl RepetitionStatus {
    /// Classify a question by the usage count it will have after this assembly.
    pub fn from_current_usage(current_usage: u32) -> Self {
        if current_usage <= 1 {
            RepetitionStatus::FirstTime
        } else {
            RepetitionStatus::Repeating {
                prior_uses: current_usage - 1,
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            RepetitionStatus::FirstTime => "first_time".to_string(),
            RepetitionStatus::Repeating { prior_uses: 1 } => "repeating_first_time".to_string(),
            RepetitionStatus::Repeating { prior_uses: 2 } => "repeating_second_time".to_string(),
            RepetitionStatus::Repeating { prior_uses } => format!("repeating_{prior_uses}_time"),
        }
    }
}

impl fmt::Display for RepetitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<RepetitionStatus> for String {
    fn from(status: RepetitionStatus) -> Self {
        status.label()
    }
}

impl TryFrom<String> for RepetitionStatus {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        let prior_uses = match label.as_str() {
            "first_time" => return Ok(RepetitionStatus::FirstTime),
            "repeating_first_time" => 1,
            "repeating_second_time" => 2,
            other => other
                .strip_prefix("repeating_")
                .and_then(|s| s.strip_suffix("_time"))
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|&n| n >= 3)
                .ok_or_else(|| format!("unknown repetition status: {other}"))?,
        };
        Ok(RepetitionStatus::Repeating { prior_uses })
    }
}

/// One question chosen for a test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedQuestion {
    pub question: Question,
    /// `used_count + 1`: the count the question will have once committed.
    pub current_usage: u32,
    pub repetition_status: RepetitionStatus,
}

/// The outcome of a preview assembly, ready to be committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub module_id: String,
    #[serde(default)]
    pub topic_id: Option<Uuid>,
    pub items: Vec<SelectedQuestion>,
}

impl SelectionResult {
    pub fn question_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|item| item.question.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Draw `count` questions without replacement from `pool`.
///
/// Fails with `InsufficientQuestions` rather than returning fewer than asked.
pub fn assemble<R: Rng + ?Sized>(
    mut pool: Vec<Question>,
    count: usize,
    rng: &mut R,
) -> Result<Vec<SelectedQuestion>, QbankError> {
    if pool.len() < count {
        return Err(QbankError::InsufficientQuestions {
            available: pool.len(),
            requested: count,
        });
    }

    pool.shuffle(rng);
    pool.truncate(count);

    Ok(pool
        .into_iter()
        .map(|question| {
            let current_usage = question.used_count.saturating_add(1);
            SelectedQuestion {
                repetition_status: RepetitionStatus::from_current_usage(current_usage),
                current_usage,
                question,
            }
        })
        .collect())
}
