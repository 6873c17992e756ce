//! Pin and pins command implementations.

use anyhow::{Context, Result};
use serde::Serialize;

use breathe_store::CacheStore;

use crate::cli::OutputFormat;
use crate::util::AppContext;

pub fn cmd_pin(ctx: &AppContext, zone: &str) -> Result<()> {
    let engine = ctx.engine()?;
    engine.load_from_cache();
    if !ctx.quiet && engine.snapshot().has_data() && engine.snapshot().zone(zone).is_none() {
        eprintln!("Note: {zone} is not in the cached zone catalog");
    }

    let pinned = engine
        .toggle_pin(zone)
        .with_context(|| format!("Failed to toggle pin for {zone}"))?;

    let content = match ctx.format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct PinJson<'a> {
                zone_id: &'a str,
                pinned: bool,
            }
            serde_json::to_string(&PinJson {
                zone_id: zone,
                pinned,
            })? + "\n"
        }
        OutputFormat::Text => {
            format!("{} {}\n", if pinned { "Pinned" } else { "Unpinned" }, zone)
        }
    };
    ctx.write(&content)
}

pub fn cmd_pins(ctx: &AppContext) -> Result<()> {
    let pins = ctx.preferences().pins().context("Failed to read pinned zones")?;

    let content = match ctx.format {
        OutputFormat::Json => serde_json::to_string_pretty(&pins)? + "\n",
        OutputFormat::Text if pins.is_empty() => "No pinned zones.\n".to_string(),
        OutputFormat::Text => {
            let zones = CacheStore::new(ctx.store.clone())
                .read()
                .map(|c| c.zones)
                .unwrap_or_default();
            pins.iter()
                .map(|id| match zones.iter().find(|z| z.id == id) {
                    Some(zone) => format!("{}  {}\n", id, zone.display_name),
                    None => format!("{}\n", id),
                })
                .collect()
        }
    };
    ctx.write(&content)
}
