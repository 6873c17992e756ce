//! Widget command implementation.

use anyhow::{Context, Result, bail};

use breathe_core::{WidgetId, WidgetState, WidgetSyncBridge};

use crate::cli::{OutputFormat, WidgetAction};
use crate::format::{format_widget_text, format_widgets_json};
use crate::util::{AppContext, now_unix};

pub async fn cmd_widget(ctx: &AppContext, action: WidgetAction) -> Result<()> {
    let bridge = ctx.bridge()?;

    match action {
        WidgetAction::Add { id } => {
            let state = bridge
                .register(id)
                .with_context(|| format!("Failed to register widget {id}"))?;
            let state = if state.zone_id.is_none() {
                bridge.tick_instance(id).await?
            } else {
                state
            };
            print_states(ctx, &[(id, state)])
        }
        WidgetAction::Remove { id } => {
            if !bridge.unregister(id)? {
                bail!("Widget {id} is not registered");
            }
            if !ctx.quiet {
                eprintln!("Removed widget {id}");
            }
            Ok(())
        }
        WidgetAction::List => {
            let states = all_states(&bridge)?;
            if states.is_empty() && ctx.format == OutputFormat::Text {
                return ctx.write("No widgets registered.\n");
            }
            print_states(ctx, &states)
        }
        WidgetAction::Show { id } => {
            let state = require_state(&bridge, id)?;
            print_states(ctx, &[(id, state)])
        }
        WidgetAction::Tick => {
            let refreshed = bridge.on_tick().await?;
            if !ctx.quiet {
                eprintln!("Refreshed {refreshed} widgets");
            }
            print_states(ctx, &all_states(&bridge)?)
        }
        WidgetAction::Next { id } => {
            require_state(&bridge, id)?;
            let state = bridge.next(id).await?;
            print_states(ctx, &[(id, state)])
        }
        WidgetAction::Prev { id } => {
            require_state(&bridge, id)?;
            let state = bridge.previous(id).await?;
            print_states(ctx, &[(id, state)])
        }
    }
}

fn require_state(bridge: &WidgetSyncBridge, id: WidgetId) -> Result<WidgetState> {
    match bridge.state(id)? {
        Some(state) => Ok(state),
        None => bail!("Widget {id} is not registered. Add it with `breathe widget add {id}`"),
    }
}

fn all_states(bridge: &WidgetSyncBridge) -> Result<Vec<(WidgetId, WidgetState)>> {
    let mut states = Vec::new();
    for id in bridge.instances()? {
        if let Some(state) = bridge.state(id)? {
            states.push((id, state));
        }
    }
    Ok(states)
}

fn print_states(ctx: &AppContext, states: &[(WidgetId, WidgetState)]) -> Result<()> {
    let content = match ctx.format {
        OutputFormat::Json => format_widgets_json(states)?,
        OutputFormat::Text => {
            let opts = ctx.format_options()?;
            let now = now_unix();
            states
                .iter()
                .map(|(id, state)| format_widget_text(*id, state, &opts, now))
                .collect()
        }
    };
    ctx.write(&content)
}
