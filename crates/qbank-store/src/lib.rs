//! qbank-store — `QuestionStore` backends.
//!
//! Provides an in-memory store and a JSON snapshot store, plus the
//! configuration layer that picks between them.

pub mod config;
pub mod file;
pub mod memory;
pub mod state;

pub use config::{load_config, load_config_from, open_store, QbankConfig, StoreConfig};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
