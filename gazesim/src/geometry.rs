//! 2D geometry shared by the gaze simulator and the pointer-driven
//! widgets (pupil tracking, favicon eye, magnetic call-to-action).
//!
//! All simulator coordinates are offsets from the viewport centre, in
//! pixels. `Viewport` converts them to screen space.

use std::ops::{Add, Mul, Sub};

// ── Point2D ─────────────────────────────────────────────────

/// 2D point or offset in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Angle of this vector in radians, measured from +x towards +y.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Unit-length vector at `angle` scaled by `length`.
    pub fn from_polar(angle: f64, length: f64) -> Self {
        Self {
            x: angle.cos() * length,
            y: angle.sin() * length,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point2D {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

// ── Viewport ────────────────────────────────────────────────

/// Size of the host viewport in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Parse a "WxH" string. Returns None unless both sides are positive.
    pub fn parse(s: &str) -> Option<Self> {
        let (w, h) = s.split_once('x')?;
        let w = w.trim().parse::<f64>().ok()?;
        let h = h.trim().parse::<f64>().ok()?;
        if w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite() {
            Some(Self::new(w, h))
        } else {
            None
        }
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.width / 2.0, self.height / 2.0)
    }

    /// Convert a centre offset to absolute screen coordinates.
    pub fn to_screen(&self, offset: Point2D) -> Point2D {
        self.center() + offset
    }

    /// Convert absolute screen coordinates to a centre offset.
    pub fn to_offset(&self, screen: Point2D) -> Point2D {
        screen - self.center()
    }

    /// Convert a position given in percent of the viewport (0-100 on
    /// each axis) to a centre offset.
    pub fn percent_to_offset(&self, px: f64, py: f64) -> Point2D {
        Point2D::new(
            (px / 100.0 - 0.5) * self.width,
            (py / 100.0 - 0.5) * self.height,
        )
    }

    /// Centre offsets for a set of percent positions.
    pub fn lay_out(&self, percents: &[Point2D]) -> Vec<Point2D> {
        percents
            .iter()
            .map(|p| self.percent_to_offset(p.x, p.y))
            .collect()
    }
}

// ── Pointer-following widgets ───────────────────────────────

/// Tuning for a pupil that looks towards the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookConfig {
    /// Pointer distance beyond which the effect saturates (None = no cap).
    pub range_cap: Option<f64>,
    /// Pointer distance per pixel of pupil travel.
    pub divisor: f64,
    /// Maximum pupil travel from the eye centre.
    pub max_offset: f64,
}

impl LookConfig {
    /// Header logo eye: 500px range, 1px per 20px, 6px travel.
    pub const LOGO: Self = Self {
        range_cap: Some(500.0),
        divisor: 20.0,
        max_offset: 6.0,
    };

    /// 32x32 favicon eye: 1px per 100px, 5px travel.
    pub const FAVICON: Self = Self {
        range_cap: None,
        divisor: 100.0,
        max_offset: 5.0,
    };
}

impl Default for LookConfig {
    fn default() -> Self {
        Self::LOGO
    }
}

/// Pupil offset for an eye centred at `origin` looking at `pointer`:
/// points along the pointer angle, distance clamped by `config`.
pub fn look_offset(origin: Point2D, pointer: Point2D, config: &LookConfig) -> Point2D {
    let delta = pointer - origin;
    let mut distance = delta.length();
    if let Some(cap) = config.range_cap {
        distance = distance.min(cap);
    }
    let travel = if config.divisor > 0.0 {
        (distance / config.divisor).min(config.max_offset)
    } else {
        config.max_offset
    };
    Point2D::from_polar(delta.angle(), travel.max(0.0))
}

/// Displacement of a magnetic element centred at `center` towards the
/// pointer. `None` pointer (pointer left the element) releases it.
pub fn magnetic_offset(center: Point2D, pointer: Option<Point2D>, strength: f64) -> Point2D {
    match pointer {
        Some(p) => (p - center) * strength,
        None => Point2D::ZERO,
    }
}

/// Default pull strength of the sticky call-to-action button.
pub const MAGNETIC_STRENGTH: f64 = 0.2;
