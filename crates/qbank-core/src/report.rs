//! Upload batch report with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decoder::TabularFormat;
use crate::model::QuestionType;

/// A row that was not accepted, with the reason shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    /// 1-based row position in the uploaded file.
    pub row: usize,
    /// Question text (or coding title) as read from the row, possibly empty.
    pub text: String,
    pub reason: String,
}

/// A row that was accepted and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedRow {
    pub row: usize,
    /// Id of the question created for this row. `None` on a dry run.
    pub question_id: Option<Uuid>,
    pub text: String,
}

/// The result of one ingestion run.
///
/// Every decoded row appears in exactly one of `accepted`, `duplicates` and
/// `invalid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadBatchReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub module_id: String,
    #[serde(default)]
    pub topic_id: Option<Uuid>,
    pub question_type: QuestionType,
    pub format: TabularFormat,
    /// `true` if the run classified rows without persisting anything.
    #[serde(default)]
    pub dry_run: bool,
    pub total: usize,
    pub accepted: Vec<AcceptedRow>,
    pub duplicates: Vec<RowIssue>,
    pub invalid: Vec<RowIssue>,
}

impl UploadBatchReport {
    pub fn valid_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }

    /// One-line summary, e.g. `total 10, valid 7, duplicate 2, invalid 1`.
    pub fn summary_line(&self) -> String {
        format!(
            "total {}, valid {}, duplicate {}, invalid {}",
            self.total,
            self.valid_count(),
            self.duplicate_count(),
            self.invalid_count()
        )
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: UploadBatchReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Upload {}:** {}{}\n\n",
            self.module_id,
            self.summary_line(),
            if self.dry_run { " (dry run)" } else { "" }
        ));

        for (heading, rows) in [("Duplicates", &self.duplicates), ("Invalid", &self.invalid)] {
            if rows.is_empty() {
                continue;
            }
            md.push_str(&format!("### {heading}\n\n"));
            md.push_str("| Row | Question | Reason |\n");
            md.push_str("|-----|----------|--------|\n");
            for issue in rows {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    issue.row,
                    issue.text.replace('|', "\\|"),
                    issue.reason.replace('|', "\\|")
                ));
            }
            md.push('\n');
        }

        md
    }
}
