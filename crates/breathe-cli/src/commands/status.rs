//! Status command implementation.
//!
//! Paints the cached snapshot first so something is visible immediately,
//! then runs a foreground refresh and prints the fresh pinned readings.

use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::OutputFormat;
use crate::format::{format_pinned_text, format_snapshot_json};
use crate::style;
use crate::util::{AppContext, now_unix};

pub async fn cmd_status(ctx: &AppContext, offline: bool) -> Result<()> {
    let engine = ctx.engine()?;
    let opts = ctx.format_options()?;
    let from_cache = engine.load_from_cache();

    if offline {
        if !from_cache && !ctx.quiet {
            eprintln!("No cached data. Run `breathe status` while online first.");
        }
        let content = match ctx.format {
            OutputFormat::Json => format_snapshot_json(&engine.snapshot(), &opts)?,
            OutputFormat::Text => format_pinned_text(&engine.snapshot(), &opts, now_unix()),
        };
        return ctx.write(&content);
    }

    // cached values go to stderr so stdout only ever carries the fresh result
    if from_cache && ctx.format == OutputFormat::Text && !ctx.quiet && ctx.output.is_none() {
        let cached = format_pinned_text(&engine.snapshot(), &opts, now_unix());
        eprint!("{}", style::dim(&format!("cached:\n{cached}"), opts.no_color));
    }

    let spinner = style::refresh_spinner(ctx.quiet);
    let result = engine.refresh(false).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match result {
        Ok(report) => debug!(
            "Refreshed {} zones, {} failed",
            report.zones,
            report.failed.len()
        ),
        Err(e) if from_cache => {
            if !ctx.quiet {
                eprintln!("Refresh failed, showing cached data: {e}");
            }
        }
        Err(e) => return Err(e).context("Failed to refresh air quality"),
    }

    let snapshot = engine.snapshot();
    let content = match ctx.format {
        OutputFormat::Json => format_snapshot_json(&snapshot, &opts)?,
        OutputFormat::Text => format_pinned_text(&snapshot, &opts, now_unix()),
    };
    ctx.write(&content)
}
