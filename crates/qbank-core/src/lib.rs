//! qbank-core — Question ingestion, assembly and usage accounting.
//!
//! This crate defines the question bank data model, the ingestion pipeline
//! (decode → normalize → validate), the store trait the rest of the workspace
//! implements, and the sampling/accounting logic used to assemble tests.

pub mod bank;
pub mod decoder;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod report;
pub mod sampler;
pub mod traits;
pub mod usage;
pub mod validator;

pub use bank::{IngestRequest, QuestionBank};
pub use error::{DecodeError, QbankError, StoreError};
