//! Config command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Config;
use crate::util::AppContext;

/// Config actions only need the file path and the effective config, so
/// this runs without opening the database.
pub fn cmd_config(
    action: ConfigAction,
    path: &Path,
    effective: &Config,
    format: OutputFormat,
) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let content = match format {
                OutputFormat::Json => serde_json::to_string_pretty(effective)? + "\n",
                OutputFormat::Text => toml::to_string_pretty(effective)
                    .context("Failed to serialize config")?,
            };
            print!("{content}");
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default()
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote default config to {}", path.display());
        }
    }
    Ok(())
}

/// Short summary of where data lives, shown by `--verbose` runs.
pub fn describe_context(ctx: &AppContext) -> String {
    format!(
        "api={} db={}",
        ctx.config.api_url,
        ctx.config.database_path().display()
    )
}
