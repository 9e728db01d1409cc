//! The question bank service.
//!
//! Wires the ingestion pipeline, topic management, assembly and usage
//! accounting over a shared `QuestionStore`.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::decoder::{self, TabularFormat};
use crate::error::QbankError;
use crate::model::{casefold, Module, ModuleCatalog, Question, QuestionBody, QuestionType, Topic};
use crate::normalizer;
use crate::report::{AcceptedRow, UploadBatchReport};
use crate::sampler::{self, SelectionResult};
use crate::traits::{QuestionStore, TopicScope};
use crate::usage::{UsageAccountant, UsageRecord};
use crate::validator::{self, Deduplicator};

/// One ingestion run.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Raw file contents.
    pub bytes: Vec<u8>,
    pub format: TabularFormat,
    pub module_id: String,
    /// Target topic; `None` files questions into the module's global pool.
    pub topic_id: Option<Uuid>,
    /// Authoritative question type; never inferred from the columns.
    pub question_type: QuestionType,
    /// Classify every row but persist nothing.
    pub dry_run: bool,
}

/// The central question bank service.
pub struct QuestionBank {
    store: Arc<dyn QuestionStore>,
    catalog: ModuleCatalog,
}

impl QuestionBank {
    pub fn new(store: Arc<dyn QuestionStore>, catalog: ModuleCatalog) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &dyn QuestionStore {
        self.store.as_ref()
    }

    fn module(&self, module_id: &str) -> Result<&Module, QbankError> {
        self.catalog
            .get(module_id)
            .ok_or_else(|| QbankError::UnknownModule(module_id.to_string()))
    }

    async fn topic_in_module(&self, module: &Module, topic_id: Uuid) -> Result<Topic, QbankError> {
        let topic = self
            .store
            .topic(topic_id)
            .await?
            .ok_or(QbankError::TopicNotFound(topic_id))?;
        if topic.module_id != module.id {
            return Err(QbankError::TopicModuleMismatch {
                topic_id,
                module_id: module.id.clone(),
            });
        }
        Ok(topic)
    }

    async fn resolve_scope(
        &self,
        module: &Module,
        topic_id: Option<Uuid>,
    ) -> Result<TopicScope, QbankError> {
        if let Some(id) = topic_id {
            self.topic_in_module(module, id).await?;
        }
        Ok(TopicScope::from(topic_id))
    }

    // -----------------------------------------------------------------------
    // Ingestion
    // -----------------------------------------------------------------------

    /// Decode, normalize, validate and (unless dry-running) persist a file.
    ///
    /// A malformed file fails the whole run with `Decode` and persists
    /// nothing; row-level problems are reported in the returned report.
    ///
    /// Deduplication against the stored corpus is advisory: the corpus is
    /// read before the insert, so two ingests of the same file running
    /// concurrently can both accept the same rows.
    pub async fn ingest(&self, request: IngestRequest) -> Result<UploadBatchReport, QbankError> {
        let module = self.module(&request.module_id)?.clone();
        let scope = self.resolve_scope(&module, request.topic_id).await?;
        if module.shape != request.question_type.shape() {
            tracing::warn!(
                module = %module.id,
                shape = %module.shape,
                question_type = %request.question_type,
                "question type differs from the module's default shape"
            );
        }

        let rows = decoder::decode(&request.bytes, request.format)?;
        let total = rows.len();
        let normalized = normalizer::normalize(&rows, request.question_type);

        let existing = self.store.questions(&module.id, scope).await?;
        let validation = validator::validate(normalized.records, &existing);

        let mut accepted = Vec::with_capacity(validation.valid.len());
        let mut new_questions = Vec::with_capacity(validation.valid.len());
        for record in validation.valid {
            let question = Question::new(module.id.clone(), request.topic_id, record.body);
            accepted.push(AcceptedRow {
                row: record.row,
                question_id: (!request.dry_run).then_some(question.id),
                text: question.text(),
            });
            new_questions.push(question);
        }

        if !request.dry_run && !new_questions.is_empty() {
            self.store.insert_questions(new_questions).await?;
        }

        let mut invalid = normalized.rejected;
        invalid.extend(validation.invalid);
        invalid.sort_by_key(|issue| issue.row);
        let mut duplicates = validation.duplicates;
        duplicates.sort_by_key(|issue| issue.row);

        let report = UploadBatchReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            module_id: module.id.clone(),
            topic_id: request.topic_id,
            question_type: request.question_type,
            format: request.format,
            dry_run: request.dry_run,
            total,
            accepted,
            duplicates,
            invalid,
        };

        tracing::info!(
            module = %report.module_id,
            dry_run = report.dry_run,
            "ingested upload: {}",
            report.summary_line()
        );
        if report.invalid_count() > 0 {
            tracing::warn!(rows = report.invalid_count(), "upload contained invalid rows");
        }
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Topics
    // -----------------------------------------------------------------------

    pub async fn list_topics(&self, module_id: &str) -> Result<Vec<Topic>, QbankError> {
        let module = self.module(module_id)?;
        let mut topics = self.store.topics(&module.id).await?;
        topics.sort_by_key(|t| casefold(&t.name));
        Ok(topics)
    }

    /// Create a topic. Names are unique per module, case-insensitively.
    pub async fn create_topic(&self, module_id: &str, name: &str) -> Result<Topic, QbankError> {
        let module = self.module(module_id)?.clone();
        let name = validate_topic_name(name)?;

        // Advisory pre-check; the store enforces uniqueness authoritatively.
        let existing = self.store.topics(&module.id).await?;
        if existing.iter().any(|t| t.name_matches(name)) {
            return Err(QbankError::DuplicateName {
                module_id: module.id,
                name: name.to_string(),
            });
        }

        let topic = Topic::new(module.id.clone(), name);
        self.store.insert_topic(topic.clone()).await?;
        tracing::info!(module = %module.id, topic = %topic.id, name, "created topic");
        Ok(topic)
    }

    /// Rename a topic. Renaming to its own current name is a no-op.
    pub async fn rename_topic(&self, topic_id: Uuid, new_name: &str) -> Result<Topic, QbankError> {
        let name = validate_topic_name(new_name)?;
        let topic = self
            .store
            .topic(topic_id)
            .await?
            .ok_or(QbankError::TopicNotFound(topic_id))?;
        if topic.name == name {
            return Ok(topic);
        }

        let siblings = self.store.topics(&topic.module_id).await?;
        if siblings
            .iter()
            .any(|t| t.id != topic_id && t.name_matches(name))
        {
            return Err(QbankError::DuplicateName {
                module_id: topic.module_id,
                name: name.to_string(),
            });
        }

        let renamed = self.store.rename_topic(topic_id, name).await?;
        tracing::info!(topic = %topic_id, from = %topic.name, to = name, "renamed topic");
        Ok(renamed)
    }

    /// Delete a topic and every question it owns. Irreversible; callers must
    /// confirm with the operator first.
    pub async fn delete_topic(&self, topic_id: Uuid) -> Result<usize, QbankError> {
        if self.store.topic(topic_id).await?.is_none() {
            return Err(QbankError::TopicNotFound(topic_id));
        }
        let deleted = self.store.delete_topic_cascade(topic_id).await?;
        tracing::info!(topic = %topic_id, deleted, "deleted topic and its questions");
        Ok(deleted)
    }

    pub async fn topic_questions(&self, topic_id: Uuid) -> Result<Vec<Question>, QbankError> {
        let topic = self
            .store
            .topic(topic_id)
            .await?
            .ok_or(QbankError::TopicNotFound(topic_id))?;
        Ok(self
            .store
            .questions(&topic.module_id, TopicScope::Topic(topic_id))
            .await?)
    }

    // -----------------------------------------------------------------------
    // Questions
    // -----------------------------------------------------------------------

    pub async fn questions(
        &self,
        module_id: &str,
        topic_id: Option<Uuid>,
    ) -> Result<Vec<Question>, QbankError> {
        let module = self.module(module_id)?.clone();
        let scope = self.resolve_scope(&module, topic_id).await?;
        Ok(self.store.questions(&module.id, scope).await?)
    }

    /// Add one question, validated and deduplicated like an ingested row.
    pub async fn add_question(
        &self,
        module_id: &str,
        topic_id: Option<Uuid>,
        body: QuestionBody,
    ) -> Result<Question, QbankError> {
        let module = self.module(module_id)?.clone();
        let scope = self.resolve_scope(&module, topic_id).await?;
        validator::check_body(&body).map_err(QbankError::InvalidQuestion)?;

        let existing = self.store.questions(&module.id, scope).await?;
        if let Some(earlier) = Deduplicator::with_existing(&existing).lookup(&body.text()) {
            return Err(QbankError::DuplicateQuestion(earlier.describe()));
        }

        let question = Question::new(module.id, topic_id, body);
        self.store.insert_questions(vec![question.clone()]).await?;
        tracing::info!(question = %question.id, "added question");
        Ok(question)
    }

    /// Replace the body of a stored question. Usage history is preserved.
    pub async fn edit_question(
        &self,
        question_id: Uuid,
        body: QuestionBody,
    ) -> Result<Question, QbankError> {
        let mut question = self
            .store
            .question(question_id)
            .await?
            .ok_or(QbankError::QuestionNotFound(question_id))?;
        if question.shape() != body.shape() {
            return Err(QbankError::InvalidQuestion(format!(
                "cannot change a {} question into a {} question",
                question.shape(),
                body.shape()
            )));
        }
        validator::check_body(&body).map_err(QbankError::InvalidQuestion)?;

        let others: Vec<Question> = self
            .store
            .questions(&question.module_id, TopicScope::from(question.topic_id))
            .await?
            .into_iter()
            .filter(|q| q.id != question_id)
            .collect();
        if let Some(earlier) = Deduplicator::with_existing(&others).lookup(&body.text()) {
            return Err(QbankError::DuplicateQuestion(earlier.describe()));
        }

        question.body = body;
        self.store.update_question(question.clone()).await?;
        tracing::info!(question = %question_id, "edited question");
        Ok(question)
    }

    pub async fn delete_question(&self, question_id: Uuid) -> Result<(), QbankError> {
        if !self.store.delete_question(question_id).await? {
            return Err(QbankError::QuestionNotFound(question_id));
        }
        tracing::info!(question = %question_id, "deleted question");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Assembly
    // -----------------------------------------------------------------------

    /// Draw `count` questions for a test without touching usage counts.
    pub async fn preview_assembly(
        &self,
        module_id: &str,
        topic_id: Option<Uuid>,
        count: usize,
    ) -> Result<SelectionResult, QbankError> {
        let (module_id, pool) = self.candidate_pool(module_id, topic_id, count).await?;
        let items = sampler::assemble(pool, count, &mut rand::thread_rng())?;
        Ok(self.selection(module_id, topic_id, items))
    }

    /// Like [`QuestionBank::preview_assembly`] with a caller-supplied generator.
    pub async fn preview_assembly_with_rng<R: Rng + Send + ?Sized>(
        &self,
        module_id: &str,
        topic_id: Option<Uuid>,
        count: usize,
        rng: &mut R,
    ) -> Result<SelectionResult, QbankError> {
        let (module_id, pool) = self.candidate_pool(module_id, topic_id, count).await?;
        let items = sampler::assemble(pool, count, rng)?;
        Ok(self.selection(module_id, topic_id, items))
    }

    async fn candidate_pool(
        &self,
        module_id: &str,
        topic_id: Option<Uuid>,
        count: usize,
    ) -> Result<(String, Vec<Question>), QbankError> {
        if count == 0 {
            return Err(QbankError::InvalidRequest(
                "question count must be at least 1".into(),
            ));
        }
        let module = self.module(module_id)?.clone();
        let scope = self.resolve_scope(&module, topic_id).await?;
        let pool = self.store.questions(&module.id, scope).await?;
        Ok((module.id, pool))
    }

    fn selection(
        &self,
        module_id: String,
        topic_id: Option<Uuid>,
        items: Vec<sampler::SelectedQuestion>,
    ) -> SelectionResult {
        let selection = SelectionResult {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            module_id,
            topic_id,
            items,
        };
        tracing::info!(
            selection = %selection.id,
            module = %selection.module_id,
            count = selection.len(),
            "previewed assembly"
        );
        selection
    }

    /// Commit a previewed selection for (`batch_id`, `course_id`).
    pub async fn commit_assembly(
        &self,
        selection: &SelectionResult,
        batch_id: &str,
        course_id: &str,
    ) -> Result<Vec<UsageRecord>, QbankError> {
        validate_audience(batch_id, course_id)?;
        UsageAccountant::new(self.store.as_ref())
            .commit(selection, batch_id, course_id)
            .await
    }

    pub async fn topic_usage(
        &self,
        topic_id: Uuid,
        batch_id: &str,
        course_id: &str,
    ) -> Result<UsageRecord, QbankError> {
        validate_audience(batch_id, course_id)?;
        UsageAccountant::new(self.store.as_ref())
            .topic_usage(topic_id, batch_id, course_id)
            .await
    }
}

fn validate_topic_name(name: &str) -> Result<&str, QbankError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(QbankError::InvalidRequest(
            "topic name must not be empty".into(),
        ));
    }
    Ok(name)
}

fn validate_audience(batch_id: &str, course_id: &str) -> Result<(), QbankError> {
    if batch_id.trim().is_empty() || course_id.trim().is_empty() {
        return Err(QbankError::InvalidRequest(
            "batch and course ids must not be empty".into(),
        ));
    }
    Ok(())
}
