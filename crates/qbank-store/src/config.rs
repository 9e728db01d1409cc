//! qbank configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use qbank_core::model::{Module, ModuleCatalog};
use qbank_core::traits::QuestionStore;

use crate::file::JsonFileStore;
use crate::memory::MemoryStore;

/// Environment variable overriding the JSON store path.
pub const STORE_PATH_ENV: &str = "QBANK_STORE_PATH";

/// Which backend holds the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Nothing survives the process. Mostly useful for tests.
    Memory,
    /// One JSON snapshot on disk.
    Json {
        #[serde(default = "default_store_path")]
        path: PathBuf,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Json {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./qbank-data/bank.json")
}

/// Top-level qbank configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QbankConfig {
    /// Number of questions drawn when `assemble` is not given a count.
    #[serde(default = "default_question_count")]
    pub default_question_count: usize,
    /// Where upload reports are written.
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    #[serde(default)]
    pub store: StoreConfig,
    /// Module catalog. Defaults to the built-in modules.
    #[serde(default = "default_modules")]
    pub modules: Vec<Module>,
}

fn default_question_count() -> usize {
    10
}
fn default_report_dir() -> PathBuf {
    PathBuf::from("./qbank-reports")
}
fn default_modules() -> Vec<Module> {
    ModuleCatalog::builtin().modules().to_vec()
}

impl Default for QbankConfig {
    fn default() -> Self {
        Self {
            default_question_count: default_question_count(),
            report_dir: default_report_dir(),
            store: StoreConfig::default(),
            modules: default_modules(),
        }
    }
}

impl QbankConfig {
    pub fn catalog(&self) -> ModuleCatalog {
        ModuleCatalog::new(self.modules.clone())
    }

    /// Render as TOML, e.g. for `qbank init`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + len]).unwrap_or_default();
        result.replace_range(start..start + len + 1, &value);
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `qbank.toml` in the current directory
/// 2. `~/.config/qbank/config.toml`
///
/// `QBANK_STORE_PATH` overrides the JSON store path.
pub fn load_config() -> Result<QbankConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QbankConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("qbank.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<QbankConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => QbankConfig::default(),
    };

    if let Ok(path) = std::env::var(STORE_PATH_ENV) {
        config.store = StoreConfig::Json {
            path: PathBuf::from(path),
        };
    }

    config.report_dir = resolve_path(&config.report_dir);
    if let StoreConfig::Json { path } = &mut config.store {
        *path = resolve_path(path);
    }

    if config.default_question_count == 0 {
        anyhow::bail!("default_question_count must be at least 1");
    }
    let mut ids: Vec<String> = config.modules.iter().map(|m| m.id.to_lowercase()).collect();
    ids.sort();
    if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
        anyhow::bail!("module '{}' is defined more than once", pair[0]);
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("qbank"))
}

/// Create a store from its configuration.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn QuestionStore>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::Json { path } => {
            let store = JsonFileStore::open(path)
                .with_context(|| format!("failed to open store: {}", path.display()))?;
            Ok(Arc::new(store))
        }
    }
}
