//! Process-local question store.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use qbank_core::model::{Question, Topic};
use qbank_core::traits::{QuestionStore, TopicScope};
use qbank_core::StoreError;

use crate::state::BankState;

/// A store that keeps the whole bank in memory.
///
/// One lock guards the entire state, so every call is serialized against
/// every other and observes a consistent snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<BankState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state (e.g. a loaded snapshot).
    pub fn with_state(state: BankState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Clone of the current state.
    pub async fn snapshot(&self) -> BankState {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn topic(&self, id: Uuid) -> Result<Option<Topic>, StoreError> {
        Ok(self.state.read().await.topic(id))
    }

    async fn topics(&self, module_id: &str) -> Result<Vec<Topic>, StoreError> {
        Ok(self.state.read().await.topics(module_id))
    }

    async fn insert_topic(&self, topic: Topic) -> Result<(), StoreError> {
        self.state.write().await.insert_topic(topic)
    }

    async fn rename_topic(&self, id: Uuid, name: &str) -> Result<Topic, StoreError> {
        self.state.write().await.rename_topic(id, name)
    }

    async fn delete_topic_cascade(&self, id: Uuid) -> Result<usize, StoreError> {
        self.state.write().await.delete_topic_cascade(id)
    }

    async fn question(&self, id: Uuid) -> Result<Option<Question>, StoreError> {
        Ok(self.state.read().await.question(id))
    }

    async fn questions(
        &self,
        module_id: &str,
        scope: TopicScope,
    ) -> Result<Vec<Question>, StoreError> {
        Ok(self.state.read().await.questions(module_id, scope))
    }

    async fn insert_questions(&self, questions: Vec<Question>) -> Result<(), StoreError> {
        self.state.write().await.insert_questions(questions)
    }

    async fn update_question(&self, question: Question) -> Result<(), StoreError> {
        self.state.write().await.update_question(question)
    }

    async fn delete_question(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.state.write().await.delete_question(id))
    }

    async fn record_usage(
        &self,
        ids: &[Uuid],
        batch_id: &str,
        course_id: &str,
    ) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .record_usage(ids, batch_id, course_id)
    }

    async fn used_question_ids(
        &self,
        batch_id: &str,
        course_id: &str,
    ) -> Result<HashSet<Uuid>, StoreError> {
        Ok(self.state.read().await.used_question_ids(batch_id, course_id))
    }
}
