//! The question store trait.
//!
//! Implemented by the `qbank-store` crate. Every method is one logical
//! operation: implementations must apply it all-or-nothing and serialize it
//! against concurrent calls touching the same data.

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Question, Topic};

/// Which questions of a module a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicScope {
    /// Every question in the module, topic-less ones included.
    Module,
    /// Only the questions filed under this topic.
    Topic(Uuid),
}

impl From<Option<Uuid>> for TopicScope {
    fn from(topic: Option<Uuid>) -> Self {
        match topic {
            Some(id) => TopicScope::Topic(id),
            None => TopicScope::Module,
        }
    }
}

/// Persistent home of topics, questions and usage ledgers.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Human-readable backend name (e.g. "memory").
    fn name(&self) -> &str;

    // -----------------------------------------------------------------------
    // Topics
    // -----------------------------------------------------------------------

    async fn topic(&self, id: Uuid) -> Result<Option<Topic>, StoreError>;

    async fn topics(&self, module_id: &str) -> Result<Vec<Topic>, StoreError>;

    /// Insert a new topic.
    ///
    /// Fails with `DuplicateName` if another topic of the same module has the
    /// same case-folded name. This is the authoritative uniqueness check.
    async fn insert_topic(&self, topic: Topic) -> Result<(), StoreError>;

    /// Rename a topic, enforcing the same uniqueness rule as `insert_topic`
    /// while ignoring the topic itself.
    async fn rename_topic(&self, id: Uuid, name: &str) -> Result<Topic, StoreError>;

    /// Delete a topic and every question it owns, returning how many
    /// questions were deleted. Either everything is deleted or nothing is.
    async fn delete_topic_cascade(&self, id: Uuid) -> Result<usize, StoreError>;

    // -----------------------------------------------------------------------
    // Questions
    // -----------------------------------------------------------------------

    async fn question(&self, id: Uuid) -> Result<Option<Question>, StoreError>;

    async fn questions(
        &self,
        module_id: &str,
        scope: TopicScope,
    ) -> Result<Vec<Question>, StoreError>;

    /// Insert a batch of new questions as one operation.
    async fn insert_questions(&self, questions: Vec<Question>) -> Result<(), StoreError>;

    /// Replace a stored question (matched by id).
    async fn update_question(&self, question: Question) -> Result<(), StoreError>;

    /// Delete one question. Returns `false` if it did not exist.
    async fn delete_question(&self, id: Uuid) -> Result<bool, StoreError>;

    // -----------------------------------------------------------------------
    // Usage
    // -----------------------------------------------------------------------

    /// Increment `used_count` of every question in `ids` and add them to the
    /// usage ledger of (`batch_id`, `course_id`). An id listed more than once
    /// counts once.
    ///
    /// Fails with `NotFound` without mutating anything if any id is unknown.
    async fn record_usage(
        &self,
        ids: &[Uuid],
        batch_id: &str,
        course_id: &str,
    ) -> Result<(), StoreError>;

    /// Ids of every question ever committed for (`batch_id`, `course_id`).
    async fn used_question_ids(
        &self,
        batch_id: &str,
        course_id: &str,
    ) -> Result<HashSet<Uuid>, StoreError>;
}
