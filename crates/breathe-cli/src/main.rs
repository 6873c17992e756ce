use std::io;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod style;
mod util;

use cli::{Cli, Commands};
use commands::*;
use config::Config;
use util::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "breathe", &mut io::stdout());
        return Ok(());
    }

    // stdout carries command output, so logs go to stderr
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let mut config = Config::load_or_default(&config_path)?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(db) = cli.database {
        config.database = Some(db);
    }
    let no_color = cli.no_color || config.no_color;
    config.validate()?;

    if let Commands::Config { action } = cli.command {
        return cmd_config(action, &config_path, &config, cli.format);
    }

    let ctx = AppContext::new(config, cli.format, no_color, cli.quiet, cli.output)?;
    debug!("Using {}", describe_context(&ctx));

    match cli.command {
        Commands::Zones { search } => cmd_zones(&ctx, search.as_deref()).await?,
        Commands::Status { offline } => cmd_status(&ctx, offline).await?,
        Commands::Read { zone } => cmd_read(&ctx, &zone).await?,
        Commands::Pin { zone } => cmd_pin(&ctx, &zone)?,
        Commands::Pins => cmd_pins(&ctx)?,
        Commands::Standard { standard } => cmd_standard(&ctx, standard.map(Into::into))?,
        Commands::Watch { interval, count } => {
            cmd_watch(&ctx, WatchArgs { interval, count })
                .await
                .context("Watch stopped")?
        }
        Commands::Widget { action } => cmd_widget(&ctx, action).await?,
        Commands::Config { .. } | Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}
