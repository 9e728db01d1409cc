//! qbank CLI — the operator-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use qbank_core::decoder::TabularFormat;
use qbank_core::model::QuestionType;

mod commands;

#[derive(Parser)]
#[command(
    name = "qbank",
    version,
    about = "Question bank ingestion and test assembly"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where an upload comes from and where it goes.
#[derive(Args)]
pub struct UploadArgs {
    /// CSV or XLSX file to upload
    #[arg(long)]
    file: PathBuf,

    /// Target module id (e.g. GRAMMAR)
    #[arg(long)]
    module: String,

    /// Target topic id; omit to file questions under the module only
    #[arg(long)]
    topic: Option<Uuid>,

    /// Question type: mcq or compiler (default: the module's shape)
    #[arg(long = "type")]
    question_type: Option<QuestionType>,

    /// File format: csv or xlsx (default: from the file extension)
    #[arg(long)]
    format: Option<TabularFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter qbank.toml
    Init,

    /// List the module catalog
    Modules,

    /// Upload questions from a CSV or XLSX file
    Ingest {
        #[command(flatten)]
        upload: UploadArgs,

        /// Classify rows without storing anything
        #[arg(long)]
        dry_run: bool,

        /// Report output: json, html, markdown, all, none
        #[arg(long, default_value = "json")]
        report: String,
    },

    /// Check an upload file without storing anything
    Validate {
        #[command(flatten)]
        upload: UploadArgs,
    },

    /// Manage topics
    Topic {
        #[command(subcommand)]
        action: TopicCommand,
    },

    /// Preview a random selection of questions
    Assemble {
        /// Module id
        #[arg(long)]
        module: String,

        /// Restrict to one topic
        #[arg(long)]
        topic: Option<Uuid>,

        /// Number of questions (default: from config)
        #[arg(long)]
        count: Option<usize>,

        /// Write the selection JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Seed the shuffle for a reproducible selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Commit a previewed selection for a batch and course
    Commit {
        /// Selection JSON written by `qbank assemble`
        #[arg(long)]
        selection: PathBuf,

        /// Batch id
        #[arg(long)]
        batch: String,

        /// Course id
        #[arg(long)]
        course: String,
    },

    /// Show topic usage for a batch and course
    Usage {
        /// Topic id; omit to show every topic of --module
        #[arg(long)]
        topic: Option<Uuid>,

        /// Module id
        #[arg(long, required_unless_present = "topic")]
        module: Option<String>,

        /// Batch id
        #[arg(long)]
        batch: String,

        /// Course id
        #[arg(long)]
        course: String,
    },

    /// Export stored questions as an upload-ready CSV
    Export {
        /// Module id
        #[arg(long)]
        module: String,

        /// Restrict to one topic
        #[arg(long)]
        topic: Option<Uuid>,

        /// Question type to export (default: the module's shape)
        #[arg(long = "type")]
        question_type: Option<QuestionType>,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print an upload template
    Template {
        /// Question type: mcq or compiler
        #[arg(long = "type")]
        question_type: QuestionType,

        /// Test case column groups for coding templates
        #[arg(long, default_value = "2")]
        test_cases: usize,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum TopicCommand {
    /// Create a topic in a module
    Create {
        #[arg(long)]
        module: String,
        #[arg(long)]
        name: String,
    },
    /// Rename a topic
    Rename {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: String,
    },
    /// Delete a topic and every question in it
    Delete {
        #[arg(long)]
        id: Uuid,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// List the topics of a module
    List {
        #[arg(long)]
        module: String,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,qbank=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(config),
        Commands::Modules => commands::modules::execute(config).await,
        Commands::Ingest {
            upload,
            dry_run,
            report,
        } => commands::ingest::execute(upload, dry_run, report, config).await,
        Commands::Validate { upload } => commands::validate::execute(upload, config).await,
        Commands::Topic { action } => commands::topic::execute(action, config).await,
        Commands::Assemble {
            module,
            topic,
            count,
            output,
            seed,
        } => commands::assemble::execute(module, topic, count, output, seed, config).await,
        Commands::Commit {
            selection,
            batch,
            course,
        } => commands::commit::execute(selection, batch, course, config).await,
        Commands::Usage {
            topic,
            module,
            batch,
            course,
        } => commands::usage::execute(topic, module, batch, course, config).await,
        Commands::Export {
            module,
            topic,
            question_type,
            output,
        } => commands::export::execute(module, topic, question_type, output, config).await,
        Commands::Template {
            question_type,
            test_cases,
            output,
        } => commands::template::execute(question_type, test_cases, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
