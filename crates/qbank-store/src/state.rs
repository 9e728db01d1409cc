//! The bank state shared by every backend.
//!
//! All operations validate before they mutate, so a failed call leaves the
//! state untouched. Backends only have to serialize calls.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use qbank_core::model::{Question, Topic};
use qbank_core::traits::TopicScope;
use qbank_core::StoreError;

/// Snapshot format version written by [`BankState`].
pub const STATE_VERSION: u32 = 1;

/// Ledger of question ids committed per batch, then per course.
pub type UsageLedger = BTreeMap<String, BTreeMap<String, BTreeSet<Uuid>>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankState {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub topics: BTreeMap<Uuid, Topic>,
    #[serde(default)]
    pub questions: BTreeMap<Uuid, Question>,
    #[serde(default)]
    pub usage: UsageLedger,
}

fn current_version() -> u32 {
    STATE_VERSION
}

impl Default for BankState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            topics: BTreeMap::new(),
            questions: BTreeMap::new(),
            usage: BTreeMap::new(),
        }
    }
}

fn not_found(kind: &'static str, id: Uuid) -> StoreError {
    StoreError::NotFound { kind, id }
}

impl BankState {
    pub fn topic(&self, id: Uuid) -> Option<Topic> {
        self.topics.get(&id).cloned()
    }

    pub fn topics(&self, module_id: &str) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self
            .topics
            .values()
            .filter(|t| t.module_id == module_id)
            .cloned()
            .collect();
        topics.sort_by_key(|t| t.created_at);
        topics
    }

    fn check_unique_name(
        &self,
        module_id: &str,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let taken = self
            .topics
            .values()
            .any(|t| t.module_id == module_id && Some(t.id) != except && t.name_matches(name));
        if taken {
            return Err(StoreError::DuplicateName {
                module_id: module_id.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub fn insert_topic(&mut self, mut topic: Topic) -> Result<(), StoreError> {
        self.check_unique_name(&topic.module_id, &topic.name, None)?;
        if self.topics.contains_key(&topic.id) {
            return Err(StoreError::Backend(format!(
                "topic id {} already exists",
                topic.id
            )));
        }
        topic.total_questions = 0;
        topic.used_questions = 0;
        let id = topic.id;
        self.topics.insert(id, topic);
        self.refresh_topic(id);
        Ok(())
    }

    pub fn rename_topic(&mut self, id: Uuid, name: &str) -> Result<Topic, StoreError> {
        let module_id = self
            .topics
            .get(&id)
            .map(|t| t.module_id.clone())
            .ok_or_else(|| not_found("topic", id))?;
        self.check_unique_name(&module_id, name, Some(id))?;

        let topic = self.topics.get_mut(&id).ok_or_else(|| not_found("topic", id))?;
        topic.name = name.to_string();
        Ok(topic.clone())
    }

    pub fn delete_topic_cascade(&mut self, id: Uuid) -> Result<usize, StoreError> {
        if self.topics.remove(&id).is_none() {
            return Err(not_found("topic", id));
        }
        let owned: Vec<Uuid> = self
            .questions
            .values()
            .filter(|q| q.topic_id == Some(id))
            .map(|q| q.id)
            .collect();
        for qid in &owned {
            self.questions.remove(qid);
        }
        self.forget_usage(&owned);
        Ok(owned.len())
    }

    pub fn question(&self, id: Uuid) -> Option<Question> {
        self.questions.get(&id).cloned()
    }

    pub fn questions(&self, module_id: &str, scope: TopicScope) -> Vec<Question> {
        let mut questions: Vec<Question> = self
            .questions
            .values()
            .filter(|q| q.module_id == module_id)
            .filter(|q| match scope {
                TopicScope::Module => true,
                TopicScope::Topic(id) => q.topic_id == Some(id),
            })
            .cloned()
            .collect();
        questions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        questions
    }

    fn check_owner(&self, question: &Question) -> Result<(), StoreError> {
        match question.topic_id {
            Some(topic_id) if !self.topics.contains_key(&topic_id) => {
                Err(not_found("topic", topic_id))
            }
            _ => Ok(()),
        }
    }

    pub fn insert_questions(&mut self, questions: Vec<Question>) -> Result<(), StoreError> {
        let mut ids = HashSet::with_capacity(questions.len());
        for q in &questions {
            self.check_owner(q)?;
            if self.questions.contains_key(&q.id) || !ids.insert(q.id) {
                return Err(StoreError::Backend(format!(
                    "question id {} already exists",
                    q.id
                )));
            }
        }

        let touched: BTreeSet<Uuid> = questions.iter().filter_map(|q| q.topic_id).collect();
        for q in questions {
            self.questions.insert(q.id, q);
        }
        for topic_id in touched {
            self.refresh_topic(topic_id);
        }
        Ok(())
    }

    pub fn update_question(&mut self, question: Question) -> Result<(), StoreError> {
        let previous_topic = self
            .questions
            .get(&question.id)
            .map(|q| q.topic_id)
            .ok_or_else(|| not_found("question", question.id))?;
        self.check_owner(&question)?;

        let topic_id = question.topic_id;
        self.questions.insert(question.id, question);
        for id in [previous_topic, topic_id].into_iter().flatten() {
            self.refresh_topic(id);
        }
        Ok(())
    }

    pub fn delete_question(&mut self, id: Uuid) -> bool {
        match self.questions.remove(&id) {
            Some(removed) => {
                self.forget_usage(&[id]);
                if let Some(topic_id) = removed.topic_id {
                    self.refresh_topic(topic_id);
                }
                true
            }
            None => false,
        }
    }

    pub fn record_usage(
        &mut self,
        ids: &[Uuid],
        batch_id: &str,
        course_id: &str,
    ) -> Result<(), StoreError> {
        if let Some(missing) = ids.iter().find(|id| !self.questions.contains_key(id)) {
            return Err(not_found("question", *missing));
        }

        let ids: BTreeSet<Uuid> = ids.iter().copied().collect();
        let mut touched = BTreeSet::new();
        for id in &ids {
            if let Some(q) = self.questions.get_mut(id) {
                q.used_count = q.used_count.saturating_add(1);
                touched.extend(q.topic_id);
            }
        }
        self.usage
            .entry(batch_id.to_string())
            .or_default()
            .entry(course_id.to_string())
            .or_default()
            .extend(ids);
        for topic_id in touched {
            self.refresh_topic(topic_id);
        }
        Ok(())
    }

    pub fn used_question_ids(&self, batch_id: &str, course_id: &str) -> HashSet<Uuid> {
        self.usage
            .get(batch_id)
            .and_then(|courses| courses.get(course_id))
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    fn forget_usage(&mut self, ids: &[Uuid]) {
        if ids.is_empty() {
            return;
        }
        for courses in self.usage.values_mut() {
            for used in courses.values_mut() {
                for id in ids {
                    used.remove(id);
                }
            }
        }
    }

    /// Recompute the denormalized question counts of one topic.
    fn refresh_topic(&mut self, topic_id: Uuid) {
        let (total, used) = self
            .questions
            .values()
            .filter(|q| q.topic_id == Some(topic_id))
            .fold((0u32, 0u32), |(total, used), q| {
                (total + 1, used + u32::from(q.used_count > 0))
            });
        if let Some(topic) = self.topics.get_mut(&topic_id) {
            topic.total_questions = total;
            topic.used_questions = used;
        }
    }
}
