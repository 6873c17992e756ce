//! Command implementations for the CLI.

mod config;
mod pin;
mod read;
mod standard;
mod status;
mod watch;
mod widget;
mod zones;

pub use config::{cmd_config, describe_context};
pub use pin::{cmd_pin, cmd_pins};
pub use read::cmd_read;
pub use standard::cmd_standard;
pub use status::cmd_status;
pub use watch::{WatchArgs, cmd_watch};
pub use widget::cmd_widget;
pub use zones::cmd_zones;
