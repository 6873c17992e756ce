//! Output formatting utilities for text and JSON output.

use std::fmt::Write as _;

use anyhow::Result;
use serde::Serialize;

use breathe_core::aqi;
use breathe_core::util::time_ago;
use breathe_core::{
    AqiStandard, PinSet, Pollutant, Reading, SyncSnapshot, WidgetId, WidgetState, Zone,
};
use breathe_types::format_pollutant_name;

use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Standard used for index values.
    pub standard: AqiStandard,
}

impl FormatOptions {
    pub fn new(no_color: bool, standard: AqiStandard) -> Self {
        Self { no_color, standard }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

// ============================================================================
// Zones
// ============================================================================

pub fn format_zones_text(zones: &[&Zone], pins: &PinSet, opts: &FormatOptions) -> String {
    if zones.is_empty() {
        return "No zones found.\n".to_string();
    }
    let width = zones.iter().map(|z| z.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for zone in zones {
        let marker = if pins.contains(&zone.id) { "*" } else { " " };
        let provider = zone
            .provider
            .as_deref()
            .map(|p| style::dim(&format!(" ({p})"), opts.no_color))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{} {:<width$}  {}{}",
            marker,
            zone.id,
            zone.display_name,
            provider,
            width = width
        );
    }
    out
}

pub fn format_zones_json(zones: &[&Zone], pins: &PinSet) -> Result<String> {
    #[derive(Serialize)]
    struct ZoneJson<'a> {
        #[serde(flatten)]
        zone: &'a Zone,
        pinned: bool,
    }

    let items: Vec<_> = zones
        .iter()
        .map(|zone| ZoneJson {
            zone,
            pinned: pins.contains(&zone.id),
        })
        .collect();
    to_json(&items)
}

// ============================================================================
// Readings
// ============================================================================

/// One summary line per reading.
pub fn format_reading_line(reading: &Reading, opts: &FormatOptions, now: i64) -> String {
    let index = aqi::display_index(reading, opts.standard);
    let updated = reading
        .observed_at_unix
        .map(|ts| format!("  {}", style::dim(&time_ago(ts as i64, now), opts.no_color)))
        .unwrap_or_default();
    format!(
        "{}: {} {} {}{}\n",
        reading.zone_name,
        style::format_index_colored(index, opts.standard, opts.no_color),
        opts.standard.label(),
        style::format_category(index, opts.standard, opts.no_color),
        updated
    )
}

/// Detailed multi-line view of one reading.
pub fn format_reading_text(reading: &Reading, opts: &FormatOptions, now: i64) -> String {
    let standard = opts.standard;
    let index = aqi::display_index(reading, standard);
    let band = aqi::band_for(index, standard);
    let mut out = String::new();

    let _ = writeln!(out, "{}", style::heading(&reading.zone_name, opts.no_color));
    let _ = writeln!(
        out,
        "  {}: {} ({})",
        standard.label(),
        style::format_index_colored(index, standard, opts.no_color),
        style::format_category(index, standard, opts.no_color)
    );
    let _ = writeln!(out, "  {}", style::band_hint(band));
    let _ = writeln!(
        out,
        "  Main pollutant: {}",
        format_pollutant_name(&reading.main_pollutant)
    );

    let levels: Vec<String> = Pollutant::ALL
        .iter()
        .filter_map(|p| {
            reading
                .concentration(*p)
                .map(|v| format!("{} {:.1}", p.display_name(), v))
        })
        .collect();
    if !levels.is_empty() {
        let _ = writeln!(out, "  Concentrations: {}", levels.join(", "));
    }

    if let Some(cigs) = reading.pm25().and_then(aqi::cigarettes_for_display) {
        let _ = writeln!(out, "  Equivalent to {:.1} cigarettes a day", cigs);
    }

    if let Some(trend) = &reading.trend {
        let mut parts = Vec::new();
        if let Some(change) = trend.change_last_hour {
            parts.push(format!("{change:+} in 1h"));
        }
        if let Some(change) = trend.change_last_24h {
            parts.push(format!("{change:+} in 24h"));
        }
        if !parts.is_empty() {
            let _ = writeln!(out, "  Trend: {}", parts.join(", "));
        }
    }

    let series = aqi::history_series(reading, standard);
    if let (Some(min), Some(max)) = (
        series.iter().map(|(_, v)| *v).min(),
        series.iter().map(|(_, v)| *v).max(),
    ) {
        let _ = writeln!(out, "  History: {} points, range {}-{}", series.len(), min, max);
    }

    if let Some(warning) = &reading.warning {
        let _ = writeln!(out, "  Warning: {}", warning);
    }

    let mut footer = format!("Source: {}", reading.provider_label());
    if let Some(ts) = reading.observed_at_unix {
        let _ = write!(footer, ", updated {}", time_ago(ts as i64, now));
    }
    let _ = writeln!(out, "  {}", style::dim(&footer, opts.no_color));
    out
}

#[derive(Serialize)]
struct ReadingJson<'a> {
    #[serde(flatten)]
    reading: &'a Reading,
    standard: AqiStandard,
    display_aqi: i32,
    category: &'static str,
    color: String,
}

impl<'a> ReadingJson<'a> {
    fn new(reading: &'a Reading, standard: AqiStandard) -> Self {
        let index = aqi::display_index(reading, standard);
        Self {
            reading,
            standard,
            display_aqi: index,
            category: aqi::category_for(index, standard),
            color: aqi::color_for(index, standard).hex(),
        }
    }
}

pub fn format_reading_json(reading: &Reading, opts: &FormatOptions) -> Result<String> {
    to_json(&ReadingJson::new(reading, opts.standard))
}

// ============================================================================
// Snapshot
// ============================================================================

/// Pinned readings of a snapshot, one line each.
pub fn format_pinned_text(snapshot: &SyncSnapshot, opts: &FormatOptions, now: i64) -> String {
    if snapshot.pinned_ids().is_empty() {
        return "No pinned zones. Pin one with `breathe pin <zone>`.\n".to_string();
    }

    let mut out = String::new();
    for reading in snapshot.pinned_readings() {
        out.push_str(&format_reading_line(reading, opts, now));
    }
    for id in snapshot.pinned_ids().iter() {
        if snapshot.reading(id).is_none() {
            let name = snapshot.zone(id).map_or(id, |z| z.display_name.as_str());
            let _ = writeln!(out, "{}: {}", name, style::dim("no reading", opts.no_color));
        }
    }
    if let Some(error) = snapshot.error() {
        let _ = writeln!(out, "{}", error);
    }
    out
}

pub fn format_snapshot_json(snapshot: &SyncSnapshot, opts: &FormatOptions) -> Result<String> {
    #[derive(Serialize)]
    struct SnapshotJson<'a> {
        pinned_ids: &'a PinSet,
        pinned: Vec<ReadingJson<'a>>,
        zones: usize,
        readings: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<&'a str>,
    }

    to_json(&SnapshotJson {
        pinned_ids: snapshot.pinned_ids(),
        pinned: snapshot
            .pinned_readings()
            .into_iter()
            .map(|r| ReadingJson::new(r, opts.standard))
            .collect(),
        zones: snapshot.zones().len(),
        readings: snapshot.all_readings().len(),
        error: snapshot.error(),
    })
}

// ============================================================================
// Widget
// ============================================================================

pub fn format_widget_text(id: WidgetId, state: &WidgetState, opts: &FormatOptions, now: i64) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "Widget {}: {}",
        id,
        style::format_widget_status(state.status, opts.no_color)
    );

    if let (Some(name), Some(index)) = (&state.zone_name, state.display_index()) {
        let standard = state.standard();
        let _ = write!(
            out,
            "  {} {} {}",
            name,
            style::format_index_colored(index, standard, opts.no_color),
            standard.label()
        );
        if state.total_pinned_count > 0 {
            let _ = write!(
                out,
                "  [{}/{}]",
                state.cursor + 1,
                state.total_pinned_count
            );
        }
    }
    if let Some(ts) = state.updated_at {
        let _ = write!(out, "  {}", style::dim(&time_ago(ts, now), opts.no_color));
    }
    out.push('\n');
    out
}

pub fn format_widgets_json(states: &[(WidgetId, WidgetState)]) -> Result<String> {
    #[derive(Serialize)]
    struct WidgetJson<'a> {
        id: WidgetId,
        #[serde(flatten)]
        state: &'a WidgetState,
        display_aqi: Option<i32>,
    }

    let items: Vec<_> = states
        .iter()
        .map(|(id, state)| WidgetJson {
            id: *id,
            state,
            display_aqi: state.display_index(),
        })
        .collect();
    to_json(&items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn plain(standard: AqiStandard) -> FormatOptions {
        FormatOptions::new(true, standard)
    }

    fn sample_reading() -> Reading {
        let mut reading = Reading::new("srinagar", 142);
        reading.zone_name = "Srinagar".to_string();
        reading.us_index_value = Some(158);
        reading.concentrations = Some(BTreeMap::from([
            ("pm2_5".to_string(), 68.2),
            ("no2".to_string(), 14.1),
        ]));
        reading.observed_at_unix = Some(1_000.0);
        reading.warning = Some("Sensor recalibrating".to_string());
        reading
    }

    #[test]
    fn test_reading_line() {
        let line = format_reading_line(&sample_reading(), &plain(AqiStandard::National), 1_000 + 300);
        assert_eq!(line, "Srinagar: 142 NAQI Moderate  5m ago\n");
    }

    #[test]
    fn test_reading_text_uses_standard() {
        let text = format_reading_text(&sample_reading(), &plain(AqiStandard::Us), 1_030);
        assert!(text.contains("US AQI: 158 (Unhealthy)"));
        assert!(text.contains("PM2.5 68.2, NO₂ 14.1"));
        assert!(text.contains("Warning: Sensor recalibrating"));
        assert!(text.contains("Source: OpenMeteo, updated Just now"));
        assert!(text.contains("cigarettes"));
    }

    #[test]
    fn test_reading_json_has_display_fields() {
        let json = format_reading_json(&sample_reading(), &plain(AqiStandard::Us)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["display_aqi"], 158);
        assert_eq!(value["aqi"], 142);
        assert_eq!(value["standard"], "us");
        assert_eq!(value["category"], "Unhealthy");
    }

    #[test]
    fn test_zones_text_marks_pins() {
        let a = Zone::new("a", "Alpha");
        let b = Zone::new("bb", "Bravo").with_provider("airgradient");
        let pins: PinSet = ["bb"].into_iter().collect();
        let text = format_zones_text(&[&a, &b], &pins, &plain(AqiStandard::National));
        assert_eq!(text, "  a   Alpha\n* bb  Bravo (airgradient)\n");
    }

    #[test]
    fn test_pinned_text_without_pins() {
        let snapshot = SyncSnapshot::default();
        let text = format_pinned_text(&snapshot, &plain(AqiStandard::National), 0);
        assert!(text.contains("No pinned zones"));
    }

    #[test]
    fn test_widget_text() {
        let state = WidgetState {
            cursor: 1,
            zone_name: Some("Jammu".to_string()),
            index_value: Some(64),
            total_pinned_count: 3,
            status: breathe_core::WidgetStatus::Success,
            ..Default::default()
        };
        let text = format_widget_text(4, &state, &plain(AqiStandard::National), 0);
        assert_eq!(text, "Widget 4: Success  Jammu 64 NAQI  [2/3]\n");
    }
}
