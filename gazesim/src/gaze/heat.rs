//! Rendering values for heatmap blobs: colour on the
//! green → yellow → red attention ramp, blob scale, and opacity.

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const GREEN: Self = Self::new(0x00, 0xff, 0x00);
    pub const YELLOW: Self = Self::new(0xff, 0xff, 0x00);
    pub const RED: Self = Self::new(0xff, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }

    /// CSS hex form, e.g. `#ff8000`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Blob styling tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatStyleConfig {
    /// Colours at intensity 0, 0.5, 1.
    pub color_stops: [Rgb; 3],
    /// Blob scale at intensity 0, 0.5, 1 while fixating.
    pub scale_stops: [f64; 3],
    /// Blob scale during a saccade.
    pub saccade_scale: f64,
    pub opacity: f64,
}

impl Default for HeatStyleConfig {
    fn default() -> Self {
        Self {
            color_stops: [Rgb::GREEN, Rgb::YELLOW, Rgb::RED],
            scale_stops: [1.0, 1.2, 1.5],
            saccade_scale: 0.5,
            opacity: 0.7,
        }
    }
}

/// Styling for one heat blob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatStyle {
    pub color: Rgb,
    pub scale: f64,
    pub opacity: f64,
}

impl HeatStyle {
    /// Derive blob styling from intensity in [0, 1]. Saccades render the
    /// cold colour at the shrunken scale regardless of intensity.
    pub fn derive(config: &HeatStyleConfig, intensity: f64, fixating: bool) -> Self {
        if !fixating {
            return Self {
                color: config.color_stops[0],
                scale: config.saccade_scale,
                opacity: config.opacity,
            };
        }
        let t = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (lo, hi, local) = if t <= 0.5 {
            (0, 1, t / 0.5)
        } else {
            (1, 2, (t - 0.5) / 0.5)
        };
        let scale = config.scale_stops[lo] + (config.scale_stops[hi] - config.scale_stops[lo]) * local;
        Self {
            color: config.color_stops[lo].lerp(config.color_stops[hi], local),
            scale,
            opacity: config.opacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_color_stops() {
        let cfg = HeatStyleConfig::default();
        assert_eq!(HeatStyle::derive(&cfg, 0.0, true).color, Rgb::GREEN);
        assert_eq!(HeatStyle::derive(&cfg, 0.5, true).color, Rgb::YELLOW);
        assert_eq!(HeatStyle::derive(&cfg, 1.0, true).color, Rgb::RED);
        assert_eq!(HeatStyle::derive(&cfg, 0.25, true).color, Rgb::new(0x80, 0xff, 0x00));
    }

    #[test]
    fn test_scale_ramp() {
        let cfg = HeatStyleConfig::default();
        assert!(approx(HeatStyle::derive(&cfg, 0.0, true).scale, 1.0));
        assert!(approx(HeatStyle::derive(&cfg, 0.5, true).scale, 1.2));
        assert!(approx(HeatStyle::derive(&cfg, 1.0, true).scale, 1.5));
        assert!(approx(HeatStyle::derive(&cfg, 0.75, true).scale, 1.35));
    }

    #[test]
    fn test_saccade_style() {
        let cfg = HeatStyleConfig::default();
        let s = HeatStyle::derive(&cfg, 0.9, false);
        assert_eq!(s.color, Rgb::GREEN);
        assert!(approx(s.scale, 0.5));
    }

    #[test]
    fn test_out_of_range_intensity_clamped() {
        let cfg = HeatStyleConfig::default();
        assert_eq!(HeatStyle::derive(&cfg, 7.0, true).color, Rgb::RED);
        assert_eq!(HeatStyle::derive(&cfg, f64::NAN, true).color, Rgb::GREEN);
    }

    #[test]
    fn test_hex() {
        assert_eq!(Rgb::new(255, 128, 0).to_hex(), "#ff8000");
    }
}
