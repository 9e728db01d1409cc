//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use qbank_core::QuestionBank;
use qbank_store::{load_config_from, open_store, QbankConfig};

pub mod assemble;
pub mod commit;
pub mod export;
pub mod ingest;
pub mod init;
pub mod modules;
pub mod template;
pub mod topic;
pub mod usage;
pub mod validate;

/// Load the configuration and open the bank it points at.
pub fn open_bank(config_path: Option<&Path>) -> Result<(QbankConfig, QuestionBank)> {
    let config = load_config_from(config_path)?;
    let store = open_store(&config.store)?;
    tracing::debug!(store = store.name(), "opened question store");
    let bank = QuestionBank::new(store, config.catalog());
    Ok((config, bank))
}

/// Write `contents` to `output`, or to stdout when no path is given.
pub fn emit(contents: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{contents}"),
    }
    Ok(())
}
