//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use time::OffsetDateTime;

use breathe_core::{
    BreatheClient, Preferences, SyncConfig, SyncEngine, WidgetSignal, WidgetSyncBridge,
};
use breathe_store::Store;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::FormatOptions;

/// Shared handles for one CLI invocation.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<Store>,
    pub format: OutputFormat,
    pub no_color: bool,
    pub quiet: bool,
    pub output: Option<PathBuf>,
}

impl AppContext {
    pub fn new(
        config: Config,
        format: OutputFormat,
        no_color: bool,
        quiet: bool,
        output: Option<PathBuf>,
    ) -> Result<Self> {
        let path = config.database_path();
        let store = Store::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        Ok(Self {
            config,
            store: Arc::new(store),
            format,
            no_color,
            quiet,
            output,
        })
    }

    pub fn client(&self) -> Result<Arc<BreatheClient>> {
        let client = BreatheClient::with_timeout(&self.config.api_url, self.config.request_timeout())
            .context("Failed to create service client")?;
        Ok(Arc::new(client))
    }

    /// Engine wired to the widget through the shared store.
    pub fn engine(&self) -> Result<SyncEngine> {
        self.engine_with(self.config.sync_config())
    }

    pub fn engine_with(&self, sync: SyncConfig) -> Result<SyncEngine> {
        let engine = SyncEngine::with_config(self.client()?, self.store.clone(), sync);
        Ok(engine.with_notifier(Arc::new(WidgetSignal::new(self.store.clone()))))
    }

    pub fn bridge(&self) -> Result<WidgetSyncBridge> {
        Ok(WidgetSyncBridge::new(self.store.clone(), self.client()?))
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::new(self.store.clone())
    }

    /// Format options using the persisted standard.
    pub fn format_options(&self) -> Result<FormatOptions> {
        let standard = self
            .preferences()
            .standard()
            .context("Failed to read AQI standard")?;
        Ok(FormatOptions::new(self.no_color, standard))
    }

    pub fn write(&self, content: &str) -> Result<()> {
        write_output(self.output.as_ref(), content)
    }
}

/// Current unix time in seconds.
pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}
