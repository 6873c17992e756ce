//! AQI conversion and classification.
//!
//! Pure functions: PM2.5 concentration to US index, severity bands, colors
//! and labels under either [`AqiStandard`], and the cigarette equivalent.
//! This is a simplified linear-breakpoint model, not a regulatory
//! implementation.
//!
//! # Example
//!
//! ```
//! use breathe_core::aqi::{self, AqiBand};
//! use breathe_types::AqiStandard;
//!
//! assert_eq!(aqi::concentration_to_us_index(9.0), 50);
//! assert_eq!(aqi::band_for(120, AqiStandard::National), AqiBand::Moderate);
//! assert_eq!(aqi::category_for(120, AqiStandard::Us), "Unhealthy for Sensitive Groups");
//! ```

use serde::{Deserialize, Serialize};

use breathe_types::{AqiStandard, HistoryPoint, Reading};

/// One PM2.5 breakpoint band: concentration range to index range.
#[derive(Debug, Clone, Copy)]
struct Breakpoint {
    c_low: f64,
    c_high: f64,
    i_low: i32,
    i_high: i32,
}

const fn bp(c_low: f64, c_high: f64, i_low: i32, i_high: i32) -> Breakpoint {
    Breakpoint {
        c_low,
        c_high,
        i_low,
        i_high,
    }
}

/// US EPA (2024) PM2.5 breakpoints in µg/m³.
const PM25_BREAKPOINTS: [Breakpoint; 7] = [
    bp(0.0, 9.0, 0, 50),
    bp(9.1, 35.4, 51, 100),
    bp(35.5, 55.4, 101, 150),
    bp(55.5, 125.4, 151, 200),
    bp(125.5, 225.4, 201, 300),
    bp(225.5, 325.4, 301, 400),
    bp(325.5, 500.0, 401, 500),
];

/// Highest concentration the breakpoint table covers.
pub const MAX_PM25: f64 = 500.0;

/// Average PM2.5 (µg/m³ over a day) equivalent to one cigarette.
pub const PM25_PER_CIGARETTE: f64 = 22.0;

/// Below this the cigarette equivalent is not worth showing.
pub const CIGARETTE_DISPLAY_THRESHOLD: f64 = 0.1;

/// Convert a PM2.5 concentration to a US AQI value.
///
/// Concentrations above [`MAX_PM25`] are clamped to the top band; negative
/// or NaN input yields 0.
pub fn concentration_to_us_index(pm25: f64) -> i32 {
    if pm25.is_nan() || pm25 <= 0.0 {
        return 0;
    }
    let c = pm25.min(MAX_PM25);

    let band = PM25_BREAKPOINTS
        .iter()
        .find(|b| c <= b.c_high)
        .unwrap_or(&PM25_BREAKPOINTS[PM25_BREAKPOINTS.len() - 1]);

    let slope = f64::from(band.i_high - band.i_low) / (band.c_high - band.c_low);
    (slope * (c - band.c_low) + f64::from(band.i_low)).round() as i32
}

/// Six severity bands shared by both standards.
///
/// The band boundaries differ per standard; see [`band_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiBand {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    VeryPoor,
    Severe,
}

impl AqiBand {
    /// All bands from best to worst.
    pub const ALL: [AqiBand; 6] = [
        AqiBand::Good,
        AqiBand::Satisfactory,
        AqiBand::Moderate,
        AqiBand::Poor,
        AqiBand::VeryPoor,
        AqiBand::Severe,
    ];

    /// Inclusive upper bounds of the first five bands.
    fn upper_bounds(standard: AqiStandard) -> [i32; 5] {
        match standard {
            AqiStandard::National => [50, 100, 200, 300, 400],
            AqiStandard::Us => [50, 100, 150, 200, 300],
        }
    }

    /// Textual label under a standard.
    pub fn label(&self, standard: AqiStandard) -> &'static str {
        match standard {
            AqiStandard::National => match self {
                AqiBand::Good => "Good",
                AqiBand::Satisfactory => "Satisfactory",
                AqiBand::Moderate => "Moderate",
                AqiBand::Poor => "Poor",
                AqiBand::VeryPoor => "Very Poor",
                AqiBand::Severe => "Severe",
            },
            AqiStandard::Us => match self {
                AqiBand::Good => "Good",
                AqiBand::Satisfactory => "Moderate",
                AqiBand::Moderate => "Unhealthy for Sensitive Groups",
                AqiBand::Poor => "Unhealthy",
                AqiBand::VeryPoor => "Very Unhealthy",
                AqiBand::Severe => "Hazardous",
            },
        }
    }

    /// Display color under a standard.
    pub fn color(&self, standard: AqiStandard) -> AqiColor {
        let palette = match standard {
            AqiStandard::National => &NATIONAL_PALETTE,
            AqiStandard::Us => &US_PALETTE,
        };
        palette[*self as usize]
    }
}

/// An opaque ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AqiColor(pub u32);

impl AqiColor {
    /// Red, green and blue components.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let [_, r, g, b] = self.0.to_be_bytes();
        (r, g, b)
    }

    /// `#RRGGBB` form.
    pub fn hex(&self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

const NATIONAL_PALETTE: [AqiColor; 6] = [
    AqiColor(0xFF55A84F),
    AqiColor(0xFFA3C853),
    AqiColor(0xFFFDD74B),
    AqiColor(0xFFFB9A34),
    AqiColor(0xFFE93F33),
    AqiColor(0xFFAF2D24),
];

const US_PALETTE: [AqiColor; 6] = [
    AqiColor(0xFF00E400),
    AqiColor(0xFFFFFF00),
    AqiColor(0xFFFF7E00),
    AqiColor(0xFFFF0000),
    AqiColor(0xFF8F3F97),
    AqiColor(0xFF7E0023),
];

/// Severity band of an index value.
///
/// Negative values fall into the first band.
pub fn band_for(index: i32, standard: AqiStandard) -> AqiBand {
    let bounds = AqiBand::upper_bounds(standard);
    bounds
        .iter()
        .position(|&upper| index <= upper)
        .map_or(AqiBand::Severe, |i| AqiBand::ALL[i])
}

/// Display color of an index value.
pub fn color_for(index: i32, standard: AqiStandard) -> AqiColor {
    band_for(index, standard).color(standard)
}

/// Severity label of an index value.
pub fn category_for(index: i32, standard: AqiStandard) -> &'static str {
    band_for(index, standard).label(standard)
}

/// Cigarettes per day with the same inhaled PM2.5, to one decimal.
pub fn cigarette_equivalent(pm25: f64) -> f64 {
    ((pm25 / PM25_PER_CIGARETTE) * 10.0).round() / 10.0
}

/// The cigarette equivalent, or `None` when it rounds below 0.1.
pub fn cigarettes_for_display(pm25: f64) -> Option<f64> {
    let cigarettes = cigarette_equivalent(pm25);
    (cigarettes >= CIGARETTE_DISPLAY_THRESHOLD).then_some(cigarettes)
}

/// Index value to show for a reading under the chosen standard.
///
/// For the US standard the service value wins; without one it is derived
/// from PM2.5, or 0 when PM2.5 is missing.
pub fn display_index(reading: &Reading, standard: AqiStandard) -> i32 {
    match standard {
        AqiStandard::National => reading.index_value,
        AqiStandard::Us => reading.us_index_value.unwrap_or_else(|| {
            match reading.pm25() {
                Some(pm25) if pm25 > 0.0 => concentration_to_us_index(pm25),
                _ => 0,
            }
        }),
    }
}

/// Index value of one history point under the chosen standard.
pub fn history_value(point: &HistoryPoint, standard: AqiStandard) -> i32 {
    match standard {
        AqiStandard::National => point.index_value,
        AqiStandard::Us => point.us_index_value.unwrap_or(point.index_value),
    }
}

/// `(timestamp, index)` pairs of a reading's history under a standard.
pub fn history_series(reading: &Reading, standard: AqiStandard) -> Vec<(i64, i32)> {
    reading
        .history_points()
        .iter()
        .map(|p| (p.timestamp_unix, history_value(p, standard)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_us_index_boundaries() {
        assert_eq!(concentration_to_us_index(0.0), 0);
        assert_eq!(concentration_to_us_index(9.0), 50);
        assert_eq!(concentration_to_us_index(9.1), 51);
        assert_eq!(concentration_to_us_index(35.4), 100);
        assert_eq!(concentration_to_us_index(35.5), 101);
        assert_eq!(concentration_to_us_index(325.4), 400);
        assert_eq!(concentration_to_us_index(500.0), 500);
    }

    #[test]
    fn test_us_index_clamps_and_rejects_bad_input() {
        assert_eq!(concentration_to_us_index(501.0), 500);
        assert_eq!(concentration_to_us_index(10_000.0), 500);
        assert_eq!(concentration_to_us_index(f64::INFINITY), 500);
        assert_eq!(concentration_to_us_index(-3.0), 0);
        assert_eq!(concentration_to_us_index(f64::NAN), 0);
    }

    #[test]
    fn test_us_index_between_band_gaps() {
        // 9.05 sits between the first two bands and lands at the bottom of
        // the second.
        assert_eq!(concentration_to_us_index(9.05), 51);
    }

    #[test]
    fn test_national_bands() {
        let s = AqiStandard::National;
        assert_eq!(band_for(0, s), AqiBand::Good);
        assert_eq!(band_for(50, s), AqiBand::Good);
        assert_eq!(band_for(51, s), AqiBand::Satisfactory);
        assert_eq!(band_for(200, s), AqiBand::Moderate);
        assert_eq!(band_for(201, s), AqiBand::Poor);
        assert_eq!(band_for(400, s), AqiBand::VeryPoor);
        assert_eq!(band_for(401, s), AqiBand::Severe);
        assert_eq!(band_for(-5, s), AqiBand::Good);
    }

    #[test]
    fn test_us_bands() {
        let s = AqiStandard::Us;
        assert_eq!(band_for(150, s), AqiBand::Moderate);
        assert_eq!(band_for(151, s), AqiBand::Poor);
        assert_eq!(band_for(300, s), AqiBand::VeryPoor);
        assert_eq!(band_for(301, s), AqiBand::Severe);
    }

    #[test]
    fn test_labels() {
        assert_eq!(category_for(75, AqiStandard::National), "Satisfactory");
        assert_eq!(category_for(75, AqiStandard::Us), "Moderate");
        assert_eq!(category_for(450, AqiStandard::National), "Severe");
        assert_eq!(category_for(450, AqiStandard::Us), "Hazardous");
        assert_eq!(category_for(250, AqiStandard::Us), "Very Unhealthy");
    }

    #[test]
    fn test_colors() {
        assert_eq!(color_for(10, AqiStandard::National).hex(), "#55A84F");
        assert_eq!(color_for(10, AqiStandard::Us).hex(), "#00E400");
        assert_eq!(color_for(350, AqiStandard::National), AqiColor(0xFFE93F33));
        assert_eq!(color_for(350, AqiStandard::Us).rgb(), (0x7E, 0x00, 0x23));
    }

    #[test]
    fn test_cigarettes() {
        assert_eq!(cigarette_equivalent(22.0), 1.0);
        assert_eq!(cigarette_equivalent(55.0), 2.5);
        assert_eq!(cigarettes_for_display(1.0), None);
        assert_eq!(cigarettes_for_display(2.2), Some(0.1));
    }

    #[test]
    fn test_display_index() {
        let mut reading = Reading::new("z", 120);
        assert_eq!(display_index(&reading, AqiStandard::National), 120);
        assert_eq!(display_index(&reading, AqiStandard::Us), 0);

        reading.concentrations = Some([("pm2_5".to_string(), 9.0)].into_iter().collect());
        assert_eq!(display_index(&reading, AqiStandard::Us), 50);

        reading.us_index_value = Some(77);
        assert_eq!(display_index(&reading, AqiStandard::Us), 77);
    }

    #[test]
    fn test_history_series_falls_back_to_national() {
        let mut reading = Reading::new("z", 1);
        reading.history = Some(vec![
            HistoryPoint {
                timestamp_unix: 1,
                index_value: 10,
                us_index_value: Some(20),
            },
            HistoryPoint {
                timestamp_unix: 2,
                index_value: 30,
                us_index_value: None,
            },
        ]);

        assert_eq!(
            history_series(&reading, AqiStandard::Us),
            vec![(1, 20), (2, 30)]
        );
        assert_eq!(
            history_series(&reading, AqiStandard::National),
            vec![(1, 10), (2, 30)]
        );
    }

    proptest! {
        #[test]
        fn prop_us_index_is_bounded(c in -100.0f64..2000.0) {
            let index = concentration_to_us_index(c);
            prop_assert!((0..=500).contains(&index));
        }

        #[test]
        fn prop_us_index_is_monotonic(a in 0.0f64..600.0, b in 0.0f64..600.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(concentration_to_us_index(lo) <= concentration_to_us_index(hi));
        }

        #[test]
        fn prop_band_is_monotonic(a in -50i32..600, b in -50i32..600, us in any::<bool>()) {
            let standard = AqiStandard::from_us_flag(us);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(band_for(lo, standard) <= band_for(hi, standard));
        }
    }
}
