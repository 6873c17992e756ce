//! Zones command implementation.

use anyhow::{Context, Result};

use breathe_core::{AqiSource, Zone};

use crate::cli::OutputFormat;
use crate::format::{format_zones_json, format_zones_text};
use crate::util::AppContext;

pub async fn cmd_zones(ctx: &AppContext, search: Option<&str>) -> Result<()> {
    let zones = ctx
        .client()?
        .list_zones()
        .await
        .context("Failed to fetch zone catalog")?;
    let pins = ctx.preferences().pins().context("Failed to read pinned zones")?;

    let query = search.unwrap_or("");
    let matching: Vec<&Zone> = zones.iter().filter(|z| z.matches(query)).collect();

    let content = match ctx.format {
        OutputFormat::Json => format_zones_json(&matching, &pins)?,
        OutputFormat::Text => format_zones_text(&matching, &pins, &ctx.format_options()?),
    };
    ctx.write(&content)
}
