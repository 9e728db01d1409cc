//! The `qbank init` command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use qbank_report::{coding_template, mcq_template};
use qbank_store::QbankConfig;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("qbank.toml"));
    if config_path.exists() {
        println!("{} already exists, skipping.", config_path.display());
    } else {
        let mut content = String::from(CONFIG_HEADER);
        content.push_str(&QbankConfig::default().to_toml()?);
        std::fs::write(&config_path, content)?;
        println!("Created {}", config_path.display());
    }

    std::fs::create_dir_all("templates")?;
    write_if_missing(Path::new("templates/mcq.csv"), &mcq_template()?)?;
    write_if_missing(Path::new("templates/coding.csv"), &coding_template(2)?)?;

    println!("\nNext steps:");
    println!("  1. Create a topic: qbank topic create --module GRAMMAR --name Tenses");
    println!("  2. Check a file:   qbank validate --module GRAMMAR --file templates/mcq.csv");
    println!("  3. Upload it:      qbank ingest --module GRAMMAR --file templates/mcq.csv");

    Ok(())
}

fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, contents)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const CONFIG_HEADER: &str = "# qbank configuration
#
# String values may reference environment variables as ${VAR}.
# QBANK_STORE_PATH overrides the JSON store path.

";
