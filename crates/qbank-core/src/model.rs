//! Core data model types for the question bank.
//!
//! Module → Topic → Question, plus the test case records carried by coding
//! questions. These are plain value records; all mutation goes through a
//! `QuestionStore`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two canonical question shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuestionShape {
    Mcq,
    Coding,
}

impl fmt::Display for QuestionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionShape::Mcq => write!(f, "MCQ"),
            QuestionShape::Coding => write!(f, "CODING"),
        }
    }
}

/// Question type selected by the caller of an ingestion run.
///
/// Authoritative: it is never inferred from the column names of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Compiler,
}

impl QuestionType {
    pub fn shape(self) -> QuestionShape {
        match self {
            QuestionType::Mcq => QuestionShape::Mcq,
            QuestionType::Compiler => QuestionShape::Coding,
        }
    }
}

impl From<QuestionShape> for QuestionType {
    fn from(shape: QuestionShape) -> Self {
        match shape {
            QuestionShape::Mcq => QuestionType::Mcq,
            QuestionShape::Coding => QuestionType::Compiler,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "mcq"),
            QuestionType::Compiler => write!(f, "compiler"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" => Ok(QuestionType::Mcq),
            "compiler" | "coding" => Ok(QuestionType::Compiler),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// A top-level question category. Modules are catalog entries, never user-created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Stable identifier (e.g. "CRT_TECHNICAL").
    pub id: String,
    /// Display name.
    pub name: String,
    /// Default question shape for this module.
    pub shape: QuestionShape,
}

/// The immutable set of modules questions can be filed under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleCatalog {
    modules: Vec<Module>,
}

impl ModuleCatalog {
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    /// The catalog shipped with qbank.
    pub fn builtin() -> Self {
        let module = |id: &str, name: &str, shape| Module {
            id: id.to_string(),
            name: name.to_string(),
            shape,
        };
        Self::new(vec![
            module("GRAMMAR", "Grammar", QuestionShape::Mcq),
            module("VOCABULARY", "Vocabulary", QuestionShape::Mcq),
            module("CRT_APTITUDE", "CRT Aptitude", QuestionShape::Mcq),
            module("CRT_REASONING", "CRT Reasoning", QuestionShape::Mcq),
            module("CRT_TECHNICAL", "CRT Technical", QuestionShape::Coding),
        ])
    }

    /// Look up a module by id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id.eq_ignore_ascii_case(id))
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A named sub-grouping of questions within a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub module_id: String,
    /// Unique per module, compared case-insensitively.
    pub name: String,
    /// Number of questions currently filed under this topic.
    #[serde(default)]
    pub total_questions: u32,
    /// Number of those questions that have been used at least once.
    #[serde(default)]
    pub used_questions: u32,
    pub created_at: DateTime<Utc>,
}

impl Topic {
    pub fn new(module_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            module_id: module_id.into(),
            name: name.into(),
            total_questions: 0,
            used_questions: 0,
            created_at: Utc::now(),
        }
    }

    /// `true` if `name` collides with this topic's name.
    pub fn name_matches(&self, name: &str) -> bool {
        casefold(&self.name) == casefold(name)
    }
}

/// Case-folded form used for topic-name uniqueness.
pub fn casefold(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Correct option of an MCQ question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerKey {
    A,
    B,
    C,
    D,
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            AnswerKey::A => "A",
            AnswerKey::B => "B",
            AnswerKey::C => "C",
            AnswerKey::D => "D",
        };
        f.write_str(key)
    }
}

impl FromStr for AnswerKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(AnswerKey::A),
            "B" => Ok(AnswerKey::B),
            "C" => Ok(AnswerKey::C),
            "D" => Ok(AnswerKey::D),
            other => Err(format!("answer '{other}' is not one of A, B, C, D")),
        }
    }
}

/// The four option texts of an MCQ question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqOptions {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

impl McqOptions {
    pub fn get(&self, key: AnswerKey) -> &str {
        match key {
            AnswerKey::A => &self.a,
            AnswerKey::B => &self.b,
            AnswerKey::C => &self.c,
            AnswerKey::D => &self.d,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqQuestion {
    pub question: String,
    pub options: McqOptions,
    pub answer: AnswerKey,
}

/// One test case of a coding question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    /// Always at least 1.
    #[serde(default = "default_points")]
    pub points: u32,
    /// Response-time budget in milliseconds.
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    #[serde(default)]
    pub is_sample: bool,
}

fn default_points() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodingQuestion {
    pub title: String,
    pub statement: String,
    pub language: String,
    pub test_cases: Vec<TestCase>,
}

/// Default target language for coding questions that don't name one.
pub const DEFAULT_LANGUAGE: &str = "python";

/// The shape-specific payload of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QuestionBody {
    Mcq(McqQuestion),
    Coding(CodingQuestion),
}

impl QuestionBody {
    pub fn shape(&self) -> QuestionShape {
        match self {
            QuestionBody::Mcq(_) => QuestionShape::Mcq,
            QuestionBody::Coding(_) => QuestionShape::Coding,
        }
    }

    /// The text questions are identified by for duplicate detection.
    pub fn text(&self) -> String {
        match self {
            QuestionBody::Mcq(mcq) => mcq.question.clone(),
            QuestionBody::Coding(coding) => format!("{}: {}", coding.title, coding.statement),
        }
    }
}

/// A stored question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub module_id: String,
    /// `None` for global-pool questions that belong to no topic.
    #[serde(default)]
    pub topic_id: Option<Uuid>,
    pub body: QuestionBody,
    /// Lifetime number of assembled tests this question was committed into.
    #[serde(default)]
    pub used_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Question {
    pub fn new(module_id: impl Into<String>, topic_id: Option<Uuid>, body: QuestionBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            module_id: module_id.into(),
            topic_id,
            body,
            used_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn text(&self) -> String {
        self.body.text()
    }

    pub fn shape(&self) -> QuestionShape {
        self.body.shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_parse() {
        assert_eq!("mcq".parse::<QuestionType>().unwrap(), QuestionType::Mcq);
        assert_eq!(
            "Compiler".parse::<QuestionType>().unwrap(),
            QuestionType::Compiler
        );
        assert_eq!(
            "coding".parse::<QuestionType>().unwrap(),
            QuestionType::Compiler
        );
        assert!("essay".parse::<QuestionType>().is_err());
    }

    #[test]
    fn answer_key_parse_is_case_insensitive() {
        assert_eq!("b".parse::<AnswerKey>().unwrap(), AnswerKey::B);
        assert_eq!(" D ".parse::<AnswerKey>().unwrap(), AnswerKey::D);
        let err = "E".parse::<AnswerKey>().unwrap_err();
        assert!(err.contains("A, B, C, D"));
    }

    #[test]
    fn catalog_lookup() {
        let catalog = ModuleCatalog::builtin();
        assert_eq!(
            catalog.get("crt_technical").map(|m| m.shape),
            Some(QuestionShape::Coding)
        );
        assert_eq!(
            catalog.get("GRAMMAR").map(|m| m.shape),
            Some(QuestionShape::Mcq)
        );
        assert!(catalog.get("COOKING").is_none());
    }

    #[test]
    fn coding_text_joins_title_and_statement() {
        let body = QuestionBody::Coding(CodingQuestion {
            title: "Perfect Number".into(),
            statement: "Check whether n is perfect".into(),
            language: DEFAULT_LANGUAGE.into(),
            test_cases: vec![],
        });
        assert_eq!(body.text(), "Perfect Number: Check whether n is perfect");
        assert_eq!(body.shape(), QuestionShape::Coding);
    }

    #[test]
    fn topic_name_matching_casefolds() {
        let topic = Topic::new("GRAMMAR", "Tenses");
        assert!(topic.name_matches("  tenses "));
        assert!(!topic.name_matches("Articles"));
    }

    #[test]
    fn question_serde_roundtrip() {
        let q = Question::new(
            "GRAMMAR",
            None,
            QuestionBody::Mcq(McqQuestion {
                question: "Pick the verb".into(),
                options: McqOptions {
                    a: "run".into(),
                    b: "blue".into(),
                    c: "table".into(),
                    d: "quickly".into(),
                },
                answer: AnswerKey::A,
            }),
        );
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains("\"kind\":\"mcq\""));
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
