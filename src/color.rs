use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use buoy_grid::data::model::{Dataset, Field, Value};

// ---------------------------------------------------------------------------
// Temperature colour ramp
// ---------------------------------------------------------------------------

/// Blue for the coldest reading, red for the warmest.
const COLD_HUE: f32 = 240.0;
const WARM_HUE: f32 = 0.0;

fn hue_to_color(hue: f32) -> Color32 {
    let hsl = Hsl::new(hue, 0.75, 0.5);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Maps temperatures onto a hue ramp spanning the observed range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempColorScale {
    pub min: f64,
    pub max: f64,
}

impl TempColorScale {
    /// Scale over all numeric `Temp` values, `None` if there are none.
    pub fn from_dataset(dataset: &Dataset) -> Option<Self> {
        let mut temps = dataset
            .column_values(Field::Temp)
            .into_iter()
            .filter_map(Value::as_f64)
            .filter(|t| t.is_finite());
        let first = temps.next()?;
        let (min, max) = temps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        Some(TempColorScale { min, max })
    }

    /// Position of `t` in the range, 0.0 (cold) to 1.0 (warm).
    pub fn fraction(&self, t: f64) -> f64 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            return 0.5;
        }
        ((t - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn color_for(&self, t: f64) -> Color32 {
        let f = self.fraction(t) as f32;
        hue_to_color(COLD_HUE + (WARM_HUE - COLD_HUE) * f)
    }

    /// Split the range into `n` equal bins: (label, lower bound, colour).
    pub fn bins(&self, n: usize) -> Vec<(String, f64, Color32)> {
        if n == 0 {
            return Vec::new();
        }
        let width = (self.max - self.min) / n as f64;
        (0..n)
            .map(|i| {
                let lo = self.min + width * i as f64;
                let hi = lo + width;
                let mid = lo + width / 2.0;
                (format!("{lo:.1}–{hi:.1}°C"), lo, self.color_for(mid))
            })
            .collect()
    }

    /// Index of the bin `t` falls in, for `n` bins.
    pub fn bin_index(&self, t: f64, n: usize) -> usize {
        let i = (self.fraction(t) * n as f64) as usize;
        i.min(n.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale() -> TempColorScale {
        TempColorScale { min: 10.0, max: 30.0 }
    }

    #[test]
    fn fraction_is_clamped() {
        assert_eq!(scale().fraction(5.0), 0.0);
        assert_eq!(scale().fraction(20.0), 0.5);
        assert_eq!(scale().fraction(99.0), 1.0);
    }

    #[test]
    fn extremes_are_blue_and_red() {
        let cold = scale().color_for(10.0);
        let warm = scale().color_for(30.0);
        assert!(cold.b() > cold.r());
        assert!(warm.r() > warm.b());
    }

    #[test]
    fn bins_cover_the_range() {
        let s = scale();
        assert_eq!(s.bins(4).len(), 4);
        assert_eq!(s.bin_index(10.0, 4), 0);
        assert_eq!(s.bin_index(30.0, 4), 3);
        assert_eq!(s.bin_index(21.0, 4), 2);
    }

    #[test]
    fn flat_range_sits_mid_ramp() {
        let s = TempColorScale { min: 5.0, max: 5.0 };
        assert_eq!(s.fraction(5.0), 0.5);
    }
}
