//! Exported questions re-ingest as duplicates of themselves.

use std::sync::Arc;

use qbank_core::decoder::TabularFormat;
use qbank_core::model::{ModuleCatalog, QuestionShape, QuestionType};
use qbank_core::{IngestRequest, QuestionBank};
use qbank_report::export_questions;
use qbank_store::MemoryStore;

fn request(csv: String, module_id: &str, question_type: QuestionType) -> IngestRequest {
    IngestRequest {
        bytes: csv.into_bytes(),
        format: TabularFormat::Csv,
        module_id: module_id.into(),
        topic_id: None,
        question_type,
        dry_run: false,
    }
}

#[tokio::test]
async fn mcq_export_reingests_as_duplicates() {
    let bank = QuestionBank::new(Arc::new(MemoryStore::new()), ModuleCatalog::builtin());
    let csv = "Question,OptionA,OptionB,OptionC,OptionD,answer\n\
               \"Which is correct, a or b?\",a,b,both,neither,c\n\
               Spell 'necessary',neccessary,necessary,necesary,nessecary,B\n";
    let first = bank
        .ingest(request(csv.to_string(), "VOCABULARY", QuestionType::Mcq))
        .await
        .unwrap();
    assert_eq!(first.valid_count(), 2);

    let stored = bank.questions("VOCABULARY", None).await.unwrap();
    let exported = export_questions(&stored, QuestionShape::Mcq).unwrap();
    assert!(exported.starts_with("Question,A,B,C,D,Answer"));

    let again = bank
        .ingest(request(exported, "VOCABULARY", QuestionType::Mcq))
        .await
        .unwrap();
    assert_eq!(again.total, 2);
    assert_eq!(again.duplicate_count(), 2);
    assert_eq!(again.invalid_count(), 0);
}

#[tokio::test]
async fn coding_export_reingests_as_duplicates() {
    let bank = QuestionBank::new(Arc::new(MemoryStore::new()), ModuleCatalog::builtin());
    let csv = "Title,Statement,Language,TestCase1Input,TestCase1Output,TestCase1Points,\
               TestCase1ResponseTime,TestCase1IsSample,TestCase2Input,TestCase2Output\n\
               Sum,Add two numbers,cpp,1 2,3,5,1000,true,4 5,9\n\
               Reverse,Reverse a string,,abc,cba,,,,,\n";
    let first = bank
        .ingest(request(
            csv.to_string(),
            "CRT_TECHNICAL",
            QuestionType::Compiler,
        ))
        .await
        .unwrap();
    assert_eq!(first.valid_count(), 2);

    let stored = bank.questions("CRT_TECHNICAL", None).await.unwrap();
    let exported = export_questions(&stored, QuestionShape::Coding).unwrap();

    let again = bank
        .ingest(request(exported, "CRT_TECHNICAL", QuestionType::Compiler))
        .await
        .unwrap();
    assert_eq!(again.duplicate_count(), 2);
    assert_eq!(again.valid_count(), 0);
}
