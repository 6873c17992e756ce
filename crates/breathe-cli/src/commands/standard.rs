//! Standard command implementation.

use anyhow::{Context, Result};

use breathe_core::AqiStandard;

use crate::cli::OutputFormat;
use crate::util::AppContext;

pub fn cmd_standard(ctx: &AppContext, standard: Option<AqiStandard>) -> Result<()> {
    let prefs = ctx.preferences();

    let current = match standard {
        Some(standard) => {
            prefs
                .set_standard(standard)
                .context("Failed to save AQI standard")?;
            // widgets copy the flag on their next tick
            ctx.engine()?.request_widget_refresh();
            standard
        }
        None => prefs.standard().context("Failed to read AQI standard")?,
    };

    let content = match ctx.format {
        OutputFormat::Json => serde_json::to_string(&current)? + "\n",
        OutputFormat::Text => format!("{} ({})\n", current.label(), current.description()),
    };
    ctx.write(&content)
}
