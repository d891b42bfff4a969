//! Configuration command.

use anyhow::{Context, Result};
use colored::Colorize;
use graphmem_core::Config;
use std::path::Path;

pub fn execute(config_path: &Path, path_only: bool, init: bool, config: &Config) -> Result<()> {
    if path_only {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        return init_file(config_path);
    }

    print!("{} {}", "Config file:".cyan(), config_path.display());
    if config_path.exists() {
        println!();
    } else {
        println!(" {}", "(not found, using defaults)".yellow());
    }
    if let Err(e) = config.validate() {
        println!("{} {}", "✗".red(), e);
    }
    println!("{}", "─".repeat(50));
    print!("{}", masked(config).to_toml_string()?);
    Ok(())
}

/// Write the default configuration unless a file already exists.
fn init_file(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!(
            "{} {} already exists",
            "○".yellow(),
            config_path.display()
        );
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(config_path, Config::default().to_toml_string()?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("{} Wrote {}", "✓".green(), config_path.display());
    Ok(())
}

/// Copy of `config` safe to print.
fn masked(config: &Config) -> Config {
    let mut shown = config.clone();
    if shown.server.token.is_some() {
        shown.server.token = Some("********".to_string());
    }
    shown
}
