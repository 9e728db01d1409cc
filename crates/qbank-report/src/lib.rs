//! qbank-report — renderers for upload reports and question files.

pub mod html;
pub mod template;

pub use html::{generate_html, write_html_report};
pub use template::{coding_template, export_questions, mcq_template, write_csv};
