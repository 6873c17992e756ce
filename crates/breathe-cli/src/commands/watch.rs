//! Watch command implementation.
//!
//! Runs the sync engine's periodic refresh and a widget host side by side,
//! printing the pinned readings after every completed pass.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use breathe_core::{SyncEvent, WidgetHost};

use crate::cli::OutputFormat;
use crate::format::{format_pinned_text, format_snapshot_json};
use crate::util::{AppContext, now_unix};

/// Arguments for the watch command.
pub struct WatchArgs {
    /// Overrides the configured refresh interval, in seconds.
    pub interval: Option<u64>,
    /// Stop after this many completed refreshes.
    pub count: Option<u32>,
}

pub async fn cmd_watch(ctx: &AppContext, args: WatchArgs) -> Result<()> {
    let WatchArgs { interval, count } = args;

    let mut sync = ctx.config.sync_config();
    if let Some(secs) = interval {
        if secs == 0 {
            bail!("--interval must be at least 1 second");
        }
        sync.refresh_interval = Duration::from_secs(secs);
    }

    let engine = Arc::new(ctx.engine_with(sync)?);
    let opts = ctx.format_options()?;
    let mut events = engine.subscribe_events();

    let cancel = CancellationToken::new();
    let host = WidgetHost::new(Arc::new(ctx.bridge()?), ctx.config.widget_host_config());
    let host_task = tokio::spawn(host.run(Some(engine.subscribe_events()), cancel.clone()));

    if engine.load_from_cache() && ctx.format == OutputFormat::Text {
        ctx.write(&format_pinned_text(&engine.snapshot(), &opts, now_unix()))?;
    }

    if !ctx.quiet {
        eprintln!(
            "Refreshing every {}s (Ctrl+C to stop)",
            engine.config().refresh_interval.as_secs()
        );
    }

    // first pass in the foreground so errors surface in the snapshot
    if let Err(e) = engine.refresh(false).await {
        warn!("Initial refresh failed: {}", e);
        if !ctx.quiet {
            eprintln!("Refresh failed: {e}");
        }
    }
    engine.start_periodic_refresh();

    let mut completed: u32 = 0;
    let result = loop {
        if count.is_some_and(|limit| completed >= limit) {
            if !ctx.quiet {
                eprintln!("Completed {} refreshes.", completed);
            }
            break Ok(());
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                break Ok(());
            }
            event = events.recv() => match event {
                Ok(SyncEvent::RefreshCompleted { .. }) => {
                    completed += 1;
                    let snapshot = engine.snapshot();
                    let written = match ctx.format {
                        OutputFormat::Json => format_snapshot_json(&snapshot, &opts),
                        OutputFormat::Text => Ok(format_pinned_text(&snapshot, &opts, now_unix())),
                    }
                    .and_then(|content| ctx.write(&content));
                    if let Err(e) = written {
                        break Err(e);
                    }
                }
                Ok(SyncEvent::CatalogFailed { error, .. }) if !ctx.quiet => {
                    eprintln!("Refresh failed: {error}");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => debug!("Skipped {} events", n),
                Err(RecvError::Closed) => break Ok(()),
            }
        }
    };

    engine.stop_periodic_refresh();
    cancel.cancel();
    if let Err(e) = host_task.await {
        warn!("Widget host task failed: {}", e);
    }
    result
}
