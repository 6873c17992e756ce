//! CLI argument definitions using clap.

use std::path::PathBuf;

use breathe_types::AqiStandard;
use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// AQI standard argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StandardArg {
    /// National AQI (NAQI)
    National,
    /// US EPA AQI
    Us,
}

impl From<StandardArg> for AqiStandard {
    fn from(arg: StandardArg) -> Self {
        match arg {
            StandardArg::National => AqiStandard::National,
            StandardArg::Us => AqiStandard::Us,
        }
    }
}

#[derive(Parser)]
#[command(name = "breathe")]
#[command(author, version, about = "Air-quality readings for your pinned zones", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Air-quality service URL (overrides config)
    #[arg(long, global = true, env = "BREATHE_API_URL")]
    pub api_url: Option<String>,

    /// Database path (overrides config)
    #[arg(long, global = true, env = "BREATHE_DB")]
    pub database: Option<PathBuf>,

    /// Config file path
    #[arg(long, global = true, env = "BREATHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List monitored zones
    Zones {
        /// Only show zones whose name or id contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show pinned zones (cached first, then refreshed)
    Status {
        /// Only show the cached snapshot, without contacting the service
        #[arg(long)]
        offline: bool,
    },

    /// Read the current air quality of one zone
    Read {
        /// Zone id
        zone: String,
    },

    /// Pin or unpin a zone
    Pin {
        /// Zone id
        zone: String,
    },

    /// List pinned zones
    Pins,

    /// Show or set the AQI standard
    Standard {
        /// Standard to use from now on
        #[arg(value_enum)]
        standard: Option<StandardArg>,
    },

    /// Keep refreshing in the background and drive the widget
    Watch {
        /// Refresh interval in seconds (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Stop after this many completed refreshes
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },

    /// Manage home-screen widget instances
    Widget {
        #[command(subcommand)]
        action: WidgetAction,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum WidgetAction {
    /// Register a widget instance
    Add {
        /// Widget instance id
        id: u32,
    },
    /// Remove a widget instance
    Remove {
        /// Widget instance id
        id: u32,
    },
    /// List widget instances
    List,
    /// Show a widget instance's state
    Show {
        /// Widget instance id
        id: u32,
    },
    /// Refresh every widget instance once
    Tick,
    /// Show the next pinned zone
    Next {
        /// Widget instance id
        id: u32,
    },
    /// Show the previous pinned zone
    Prev {
        /// Widget instance id
        id: u32,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["breathe", "status", "--format", "json", "--no-color"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Commands::Status { offline: false }));
    }

    #[test]
    fn test_parse_widget_next() {
        let cli = Cli::try_parse_from(["breathe", "widget", "next", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Widget {
                action: WidgetAction::Next { id: 7 }
            }
        ));
    }

    #[test]
    fn test_parse_standard() {
        let cli = Cli::try_parse_from(["breathe", "standard", "us"]).unwrap();
        match cli.command {
            Commands::Standard { standard: Some(arg) } => {
                assert_eq!(AqiStandard::from(arg), AqiStandard::Us)
            }
            _ => panic!("expected standard command"),
        }
    }
}
