//! Command-line interface for breathe air-quality zones.
//!
//! The `breathe` binary keeps a local copy of the zone catalog and the latest
//! readings, lets you pin the zones you care about, and drives the same
//! home-screen widget state a phone launcher would.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `zones` | List monitored zones, optionally filtered with `--search` |
//! | `status` | Show pinned zones, cached first and then refreshed |
//! | `read` | Full reading for one zone |
//! | `pin` | Pin or unpin a zone |
//! | `pins` | List pinned zones |
//! | `standard` | Show or set the AQI standard (`national` or `us`) |
//! | `watch` | Refresh periodically and keep widgets current |
//! | `widget` | Manage widget instances (`add`, `remove`, `list`, `show`, `tick`, `next`, `prev`) |
//! | `config` | Manage CLI configuration |
//! | `completions` | Generate shell completions |
//!
//! # Configuration
//!
//! Settings live in `~/.config/breathe/config.toml` (or the platform
//! equivalent):
//!
//! ```toml
//! api_url = "http://localhost:8000"
//! request_timeout_secs = 10
//!
//! [sync]
//! refresh_interval_secs = 60
//! fetch_scope = "full_catalog"
//! max_concurrent_fetches = 16
//! retries = 0
//!
//! [widget]
//! refresh_interval_secs = 1800
//! signal_poll_secs = 2
//! ```
//!
//! # Environment Variables
//!
//! - `BREATHE_API_URL`: service URL (overridden by `--api-url`)
//! - `BREATHE_DB`: database path (overridden by `--database`)
//! - `BREATHE_CONFIG`: config file path
//! - `NO_COLOR`: disable colored output when set
//!
//! # Examples
//!
//! ```bash
//! breathe zones --search srinagar
//! breathe pin srinagar
//! breathe status
//! breathe widget add 1 && breathe widget next 1
//! breathe watch --interval 120
//! ```

// The binary lives in main.rs; this re-exports the library stack for
// programmatic use.
pub use breathe_core;
pub use breathe_store;
pub use breathe_types;
