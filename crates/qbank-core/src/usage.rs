//! Usage accounting per (batch, course) pair.
//!
//! Usage records are derived: they are recomputed from the store's ledger and
//! the topic's current questions every time they are asked for.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QbankError;
use crate::model::{Question, Topic};
use crate::sampler::SelectionResult;
use crate::traits::{QuestionStore, TopicScope};

/// Percentage at which a topic is reported as nearing exhaustion.
pub const NEARING_EXHAUSTION_PCT: f64 = 75.0;
/// Percentage at which a topic is reported as fully used.
pub const FULLY_USED_PCT: f64 = 100.0;

/// Informational threshold classification. Never blocks selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLevel {
    Available,
    NearingExhaustion,
    FullyUsed,
}

impl UsageLevel {
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= FULLY_USED_PCT {
            UsageLevel::FullyUsed
        } else if pct >= NEARING_EXHAUSTION_PCT {
            UsageLevel::NearingExhaustion
        } else {
            UsageLevel::Available
        }
    }
}

/// Usage of one topic for one (batch, course) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub topic_id: Uuid,
    pub batch_id: String,
    pub course_id: String,
    pub used_questions: u32,
    pub total_questions: u32,
    /// `used / total * 100`, clamped to `0..=100`; 0 for an empty topic.
    pub percentage: f64,
    pub level: UsageLevel,
}

/// Compute the usage record of `topic` from its questions and the ledger of
/// question ids used for (`batch_id`, `course_id`).
pub fn compute_topic_usage(
    topic: &Topic,
    questions: &[Question],
    used: &HashSet<Uuid>,
    batch_id: &str,
    course_id: &str,
) -> UsageRecord {
    let owned = questions
        .iter()
        .filter(|q| q.topic_id == Some(topic.id));
    let (total, used_count) = owned.fold((0u32, 0u32), |(total, u), q| {
        (total + 1, u + u32::from(used.contains(&q.id)))
    });

    let percentage = if total == 0 {
        0.0
    } else {
        (f64::from(used_count) / f64::from(total) * 100.0).clamp(0.0, 100.0)
    };

    UsageRecord {
        topic_id: topic.id,
        batch_id: batch_id.to_string(),
        course_id: course_id.to_string(),
        used_questions: used_count,
        total_questions: total,
        percentage,
        level: UsageLevel::from_percentage(percentage),
    }
}

/// Applies committed selections to the store and reports topic usage.
pub struct UsageAccountant<'a> {
    store: &'a dyn QuestionStore,
}

impl<'a> UsageAccountant<'a> {
    pub fn new(store: &'a dyn QuestionStore) -> Self {
        Self { store }
    }

    /// Record one use of every selected question for (`batch_id`,
    /// `course_id`) and return the recomputed usage of each affected topic.
    ///
    /// Each distinct question counts once per call. Committing the same
    /// selection again records another use, as a re-issued test would.
    pub async fn commit(
        &self,
        selection: &SelectionResult,
        batch_id: &str,
        course_id: &str,
    ) -> Result<Vec<UsageRecord>, QbankError> {
        let ids = selection.question_ids();
        self.store.record_usage(&ids, batch_id, course_id).await?;

        let topics: BTreeSet<Uuid> = selection
            .items
            .iter()
            .filter_map(|item| item.question.topic_id)
            .collect();

        let mut records = Vec::with_capacity(topics.len());
        for topic_id in topics {
            // A topic deleted between preview and commit has nothing to report.
            if let Some(topic) = self.store.topic(topic_id).await? {
                records.push(self.usage_for(&topic, batch_id, course_id).await?);
            }
        }

        for record in &records {
            match record.level {
                UsageLevel::FullyUsed => tracing::warn!(
                    topic = %record.topic_id,
                    batch = batch_id,
                    course = course_id,
                    "topic fully used"
                ),
                UsageLevel::NearingExhaustion => tracing::warn!(
                    topic = %record.topic_id,
                    pct = record.percentage,
                    "topic nearing exhaustion"
                ),
                UsageLevel::Available => {}
            }
        }

        tracing::info!(
            selection = %selection.id,
            questions = ids.len(),
            batch = batch_id,
            course = course_id,
            "committed assembly"
        );
        Ok(records)
    }

    /// Current usage of one topic for (`batch_id`, `course_id`).
    pub async fn topic_usage(
        &self,
        topic_id: Uuid,
        batch_id: &str,
        course_id: &str,
    ) -> Result<UsageRecord, QbankError> {
        let topic = self
            .store
            .topic(topic_id)
            .await?
            .ok_or(QbankError::TopicNotFound(topic_id))?;
        self.usage_for(&topic, batch_id, course_id).await
    }

    async fn usage_for(
        &self,
        topic: &Topic,
        batch_id: &str,
        course_id: &str,
    ) -> Result<UsageRecord, QbankError> {
        let questions = self
            .store
            .questions(&topic.module_id, TopicScope::Topic(topic.id))
            .await?;
        let used = self.store.used_question_ids(batch_id, course_id).await?;
        Ok(compute_topic_usage(
            topic, &questions, &used, batch_id, course_id,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CodingQuestion, QuestionBody, TestCase};

    fn coding_questions(topic: &Topic, n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    topic.module_id.clone(),
                    Some(topic.id),
                    QuestionBody::Coding(CodingQuestion {
                        title: format!("Problem {i}"),
                        statement: "Solve it".into(),
                        language: "python".into(),
                        test_cases: vec![TestCase {
                            input: "1".into(),
                            expected_output: "1".into(),
                            points: 1,
                            response_time_ms: None,
                            is_sample: true,
                        }],
                    }),
                )
            })
            .collect()
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(UsageLevel::from_percentage(0.0), UsageLevel::Available);
        assert_eq!(UsageLevel::from_percentage(74.9), UsageLevel::Available);
        assert_eq!(
            UsageLevel::from_percentage(75.0),
            UsageLevel::NearingExhaustion
        );
        assert_eq!(UsageLevel::from_percentage(100.0), UsageLevel::FullyUsed);
    }

    #[test]
    fn percentage_of_used_questions() {
        let topic = Topic::new("CRT_TECHNICAL", "Arrays");
        let questions = coding_questions(&topic, 4);
        let used: HashSet<Uuid> = questions.iter().take(3).map(|q| q.id).collect();

        let record = compute_topic_usage(&topic, &questions, &used, "B1", "C1");
        assert_eq!(record.used_questions, 3);
        assert_eq!(record.total_questions, 4);
        assert!((record.percentage - 75.0).abs() < f64::EPSILON);
        assert_eq!(record.level, UsageLevel::NearingExhaustion);
    }

    #[test]
    fn ids_outside_the_topic_are_ignored() {
        let topic = Topic::new("CRT_TECHNICAL", "Arrays");
        let other = Topic::new("CRT_TECHNICAL", "Strings");
        let mut questions = coding_questions(&topic, 2);
        let foreign = coding_questions(&other, 1);
        let used: HashSet<Uuid> = foreign.iter().map(|q| q.id).collect();
        questions.extend(foreign);

        let record = compute_topic_usage(&topic, &questions, &used, "B1", "C1");
        assert_eq!(record.used_questions, 0);
        assert_eq!(record.total_questions, 2);
    }

    #[test]
    fn empty_topic_reports_zero() {
        let topic = Topic::new("GRAMMAR", "Empty");
        let record = compute_topic_usage(&topic, &[], &HashSet::new(), "B1", "C1");
        assert_eq!(record.percentage, 0.0);
        assert_eq!(record.level, UsageLevel::Available);
    }
}
