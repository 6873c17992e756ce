//! Visual styling utilities for the CLI.

use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use breathe_core::aqi::{self, AqiBand};
use breathe_core::{AqiStandard, WidgetStatus};

/// Standard spinner tick characters (Braille dots animation)
const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard spinner tick interval
const SPINNER_TICK_MS: u64 = 80;

/// Spinner for a refresh, or `None` when stderr is not a terminal.
pub fn refresh_spinner(quiet: bool) -> Option<ProgressBar> {
    if quiet || !io::stderr().is_terminal() {
        return None;
    }
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .ok()?
        .tick_chars(SPINNER_TICK_CHARS);
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message("Refreshing air quality...");
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    Some(pb)
}

/// Index value painted in its band color.
pub fn format_index_colored(index: i32, standard: AqiStandard, no_color: bool) -> String {
    if no_color {
        return index.to_string();
    }
    let (r, g, b) = aqi::color_for(index, standard).rgb();
    format!("{}", index.to_string().truecolor(r, g, b).bold())
}

/// Band label, colored like its index.
pub fn format_category(index: i32, standard: AqiStandard, no_color: bool) -> String {
    let band = aqi::band_for(index, standard);
    let label = band.label(standard);
    if no_color {
        return label.to_string();
    }
    let (r, g, b) = band.color(standard).rgb();
    format!("{}", label.truecolor(r, g, b))
}

/// Short health hint for a band.
pub fn band_hint(band: AqiBand) -> &'static str {
    match band {
        AqiBand::Good => "Air is clean",
        AqiBand::Satisfactory => "Acceptable for most people",
        AqiBand::Moderate => "Sensitive groups should limit exertion",
        AqiBand::Poor => "Limit prolonged outdoor activity",
        AqiBand::VeryPoor => "Avoid outdoor activity",
        AqiBand::Severe => "Stay indoors",
    }
}

pub fn format_widget_status(status: WidgetStatus, no_color: bool) -> String {
    if no_color {
        return status.to_string();
    }
    match status {
        WidgetStatus::Success => format!("{}", status.green()),
        WidgetStatus::Loading => format!("{}", status.yellow()),
        WidgetStatus::Error => format!("{}", status.red()),
        WidgetStatus::Empty => format!("{}", status.dimmed()),
    }
}

/// Dimmed secondary text.
pub fn dim(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("{}", text.dimmed())
    }
}

/// Bold heading text.
pub fn heading(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("{}", text.bold())
    }
}
