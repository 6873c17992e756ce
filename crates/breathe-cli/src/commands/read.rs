//! Read command implementation.

use anyhow::{Context, Result};

use breathe_core::AqiSource;

use crate::cli::OutputFormat;
use crate::format::{format_reading_json, format_reading_text};
use crate::util::{AppContext, now_unix};

pub async fn cmd_read(ctx: &AppContext, zone: &str) -> Result<()> {
    let reading = ctx
        .client()?
        .zone_aqi(zone)
        .await
        .with_context(|| format!("Failed to read zone {zone}"))?;
    let opts = ctx.format_options()?;

    let content = match ctx.format {
        OutputFormat::Json => format_reading_json(&reading, &opts)?,
        OutputFormat::Text => format_reading_text(&reading, &opts, now_unix()),
    };
    ctx.write(&content)
}
