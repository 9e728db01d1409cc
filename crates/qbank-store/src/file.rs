//! Question store persisted as a single JSON snapshot.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use uuid::Uuid;

use qbank_core::model::{Question, Topic};
use qbank_core::traits::{QuestionStore, TopicScope};
use qbank_core::StoreError;

use crate::state::{BankState, STATE_VERSION};

/// A store that rewrites its JSON file after every mutation.
///
/// Each mutation is applied to a copy of the state, written to a temp file
/// next to the target and renamed over it. The in-memory state is only
/// replaced once the rename succeeded, so a failed write changes nothing.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: RwLock<BankState>,
}

impl JsonFileStore {
    /// Open the snapshot at `path`, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let state: BankState = serde_json::from_str(&content)?;
            if state.version > STATE_VERSION {
                return Err(StoreError::Backend(format!(
                    "{} was written by a newer qbank (snapshot version {})",
                    path.display(),
                    state.version
                )));
            }
            tracing::debug!(
                path = %path.display(),
                topics = state.topics.len(),
                questions = state.questions.len(),
                "loaded store snapshot"
            );
            state
        } else {
            BankState::default()
        };
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &BankState) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, state)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    /// Apply `op` to a copy of the state, persist it, then publish it.
    async fn mutate<T: Send>(
        &self,
        op: impl FnOnce(&mut BankState) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        let out = op(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(out)
    }
}

#[async_trait]
impl QuestionStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn topic(&self, id: Uuid) -> Result<Option<Topic>, StoreError> {
        Ok(self.state.read().await.topic(id))
    }

    async fn topics(&self, module_id: &str) -> Result<Vec<Topic>, StoreError> {
        Ok(self.state.read().await.topics(module_id))
    }

    async fn insert_topic(&self, topic: Topic) -> Result<(), StoreError> {
        self.mutate(|s| s.insert_topic(topic)).await
    }

    async fn rename_topic(&self, id: Uuid, name: &str) -> Result<Topic, StoreError> {
        self.mutate(|s| s.rename_topic(id, name)).await
    }

    async fn delete_topic_cascade(&self, id: Uuid) -> Result<usize, StoreError> {
        self.mutate(|s| s.delete_topic_cascade(id)).await
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
        self.mutate(|s| s.insert_questions(questions)).await
    }

    async fn update_question(&self, question: Question) -> Result<(), StoreError> {
        self.mutate(|s| s.update_question(question)).await
    }

    async fn delete_question(&self, id: Uuid) -> Result<bool, StoreError> {
        // Nothing to write when the question is already gone.
        if self.state.read().await.question(id).is_none() {
            return Ok(false);
        }
        self.mutate(|s| Ok(s.delete_question(id))).await
    }

    async fn record_usage(
        &self,
        ids: &[Uuid],
        batch_id: &str,
        course_id: &str,
    ) -> Result<(), StoreError> {
        self.mutate(|s| s.record_usage(ids, batch_id, course_id))
            .await
    }

    async fn used_question_ids(
        &self,
        batch_id: &str,
        course_id: &str,
    ) -> Result<HashSet<Uuid>, StoreError> {
        Ok(self.state.read().await.used_question_ids(batch_id, course_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("bank.json")).unwrap();
        assert!(store.topics("GRAMMAR").await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn mutations_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bank.json");

        let store = JsonFileStore::open(&path).unwrap();
        let topic = Topic::new("GRAMMAR", "Tenses");
        store.insert_topic(topic.clone()).await.unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        let loaded = reopened.topic(topic.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Tenses");
    }

    #[tokio::test]
    async fn rejected_mutation_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        let store = JsonFileStore::open(&path).unwrap();
        store
            .insert_topic(Topic::new("GRAMMAR", "Tenses"))
            .await
            .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = store
            .insert_topic(Topic::new("GRAMMAR", "tenses"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn newer_snapshot_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(&path, r#"{"version": 99}"#).unwrap();
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("newer qbank"));
    }
}
