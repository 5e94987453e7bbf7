//! Scale mappings from metric values to visual magnitudes
//!
//! - LinearScale / PowScale: numeric domain -> numeric range, optional ceiling
//! - ColorScale: piecewise-linear interpolation between RGB stops
//! - TimeScale: epoch millis -> pixels (sparkline x axis)
//!
//! The circuit scales at the bottom of the file are the ones the dashboard
//! uses for every element.

use serde::{Deserialize, Serialize};

/// 8-bit RGB color produced by the color scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let channel = |a: u8, b: u8| -> u8 {
            let v = a as f64 + (b as f64 - a as f64) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
        )
    }
}

/// Named stops used by the circuit scales
pub mod palette {
    use super::Rgb;

    pub const BLUE: Rgb = Rgb::new(0x2a, 0xac, 0xe3);
    pub const YELLOW: Rgb = Rgb::new(0xff, 0xcc, 0x00);
    pub const ORANGE: Rgb = Rgb::new(0xff, 0x99, 0x00);
    pub const RED: Rgb = Rgb::new(0xff, 0x00, 0x00);
    pub const GREY: Rgb = Rgb::new(0x80, 0x80, 0x80);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
}

/// Normalize `x` within `[d0, d1]`; a zero-width domain maps to 0
#[inline]
fn normalize(x: f64, d0: f64, d1: f64) -> f64 {
    let span = d1 - d0;
    if span == 0.0 {
        0.0
    } else {
        (x - d0) / span
    }
}

// ============================================================================
// Numeric scales
// ============================================================================

/// Linear mapping `[d0, d1] -> [r0, r1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
    ceiling: Option<f64>,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            domain,
            range,
            ceiling: None,
        }
    }

    /// Saturate outputs above `max`
    pub fn with_ceiling(mut self, max: f64) -> Self {
        self.ceiling = Some(max);
        self
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn map(&self, x: f64) -> f64 {
        let t = normalize(x, self.domain.0, self.domain.1);
        let y = self.range.0 + (self.range.1 - self.range.0) * t;
        match self.ceiling {
            Some(max) if y > max => max,
            _ => y,
        }
    }

    /// Extend the domain outward to round tick boundaries (about 10 ticks).
    ///
    /// Step is a power of ten times 1, 2 or 5. A zero-width domain is left
    /// untouched.
    pub fn nice(mut self) -> Self {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        let Some(step) = tick_step(lo, hi, 10.0) else {
            return self;
        };
        let nice_lo = (lo / step).floor() * step;
        let nice_hi = (hi / step).ceil() * step;
        self.domain = if self.domain.0 <= self.domain.1 {
            (nice_lo, nice_hi)
        } else {
            (nice_hi, nice_lo)
        };
        self
    }
}

/// Tick step for `[lo, hi]` split into roughly `count` intervals
fn tick_step(lo: f64, hi: f64, count: f64) -> Option<f64> {
    let span = hi - lo;
    if !span.is_finite() || span <= 0.0 {
        return None;
    }
    let mut step = 10f64.powf((span / count).log10().floor());
    let err = count / span * step;
    if err <= 0.15 {
        step *= 10.0;
    } else if err <= 0.35 {
        step *= 5.0;
    } else if err <= 0.75 {
        step *= 2.0;
    }
    Some(step)
}

/// Power mapping: `x^exponent` interpolated linearly into the range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowScale {
    exponent: f64,
    inner: LinearScale,
}

impl PowScale {
    pub fn new(exponent: f64, domain: (f64, f64), range: (f64, f64)) -> Self {
        let powed = (signed_pow(domain.0, exponent), signed_pow(domain.1, exponent));
        Self {
            exponent,
            inner: LinearScale::new(powed, range),
        }
    }

    pub fn with_ceiling(mut self, max: f64) -> Self {
        self.inner = self.inner.with_ceiling(max);
        self
    }

    pub fn map(&self, x: f64) -> f64 {
        self.inner.map(signed_pow(x, self.exponent))
    }
}

#[inline]
fn signed_pow(x: f64, e: f64) -> f64 {
    if x < 0.0 {
        -(-x).powf(e)
    } else {
        x.powf(e)
    }
}

/// Linear mapping of epoch milliseconds onto pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    inner: LinearScale,
}

impl TimeScale {
    pub fn new(start_ms: i64, end_ms: i64, range: (f64, f64)) -> Self {
        Self {
            inner: LinearScale::new((start_ms as f64, end_ms as f64), range),
        }
    }

    pub fn map(&self, t_ms: i64) -> f64 {
        self.inner.map(t_ms as f64)
    }
}

// ============================================================================
// Color scale
// ============================================================================

/// Piecewise-linear color ramp over ascending breakpoints.
///
/// Inputs outside the breakpoints saturate to the first/last stop.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    stops: Vec<(f64, Rgb)>,
}

impl ColorScale {
    /// `breakpoints` and `colors` must have the same, non-zero length
    pub fn new(breakpoints: &[f64], colors: &[Rgb]) -> Self {
        debug_assert_eq!(breakpoints.len(), colors.len());
        debug_assert!(!breakpoints.is_empty());
        Self {
            stops: breakpoints.iter().copied().zip(colors.iter().copied()).collect(),
        }
    }

    pub fn map(&self, x: f64) -> Rgb {
        let Some(&(first_at, first)) = self.stops.first() else {
            return palette::BLACK;
        };
        if x.is_nan() || x <= first_at {
            return first;
        }
        for pair in self.stops.windows(2) {
            let (d0, c0) = pair[0];
            let (d1, c1) = pair[1];
            if x <= d1 {
                return c0.lerp(c1, normalize(x, d0, d1));
            }
        }
        self.stops.last().map_or(first, |&(_, c)| c)
    }
}

// ============================================================================
// Circuit scales
// ============================================================================

pub const MAX_RADIUS: f64 = 125.0;
pub const MAX_X_PERCENT: f64 = 40.0;
pub const MAX_Y_PERCENT: f64 = 40.0;

/// The four mappings applied to every circuit element.
///
/// Radius and position are driven by per-host request rate; fill color by
/// error percentage on the load ramp; error text by the error ramp.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitScales {
    pub radius: PowScale,
    pub x: LinearScale,
    pub y: LinearScale,
    pub load_color: ColorScale,
    pub error_color: ColorScale,
}

impl Default for CircuitScales {
    fn default() -> Self {
        use palette::*;
        Self {
            radius: PowScale::new(0.5, (0.0, 600.0), (5.0, MAX_RADIUS)).with_ceiling(MAX_RADIUS),
            x: LinearScale::new((0.0, 600.0), (30.0, MAX_X_PERCENT)).with_ceiling(MAX_X_PERCENT),
            y: LinearScale::new((0.0, 600.0), (30.0, MAX_Y_PERCENT)).with_ceiling(MAX_Y_PERCENT),
            load_color: ColorScale::new(&[10.0, 25.0, 40.0, 50.0], &[BLUE, YELLOW, ORANGE, RED]),
            error_color: ColorScale::new(&[0.0, 10.0, 35.0, 50.0], &[GREY, BLACK, ORANGE, RED]),
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
    fn test_radius_scale() {
        let scales = CircuitScales::default();
        assert!(approx(scales.radius.map(0.0), 5.0));
        assert!(approx(scales.radius.map(600.0), 125.0));
        // sqrt(150)/sqrt(600) = 0.5
        assert!(approx(scales.radius.map(150.0), 65.0));
        // Saturates past the domain ceiling
        assert!(approx(scales.radius.map(10_000.0), MAX_RADIUS));
    }

    #[test]
    fn test_position_scale_clamps() {
        let scales = CircuitScales::default();
        assert!(approx(scales.x.map(0.0), 30.0));
        assert!(approx(scales.x.map(300.0), 35.0));
        assert!(approx(scales.y.map(600.0), 40.0));
        assert!(approx(scales.y.map(1200.0), MAX_Y_PERCENT));
    }

    #[test]
    fn test_color_scale_stops() {
        let scales = CircuitScales::default();
        assert_eq!(scales.load_color.map(10.0), palette::BLUE);
        assert_eq!(scales.load_color.map(0.0), palette::BLUE);
        assert_eq!(scales.load_color.map(50.0), palette::RED);
        assert_eq!(scales.load_color.map(99.0), palette::RED);
        assert_eq!(scales.error_color.map(10.0), palette::BLACK);
        // Halfway grey -> black
        assert_eq!(scales.error_color.map(5.0), Rgb::new(0x40, 0x40, 0x40));
        assert_eq!(scales.error_color.map(0.0).to_hex(), "#808080");
    }

    #[test]
    fn test_nice_domain() {
        let s = LinearScale::new((0.3, 9.7), (60.0, 0.0)).nice();
        assert_eq!(s.domain(), (0.0, 10.0));

        let s = LinearScale::new((12.0, 87.0), (60.0, 0.0)).nice();
        assert_eq!(s.domain(), (10.0, 90.0));

        // Zero-width domain maps to the range start
        let s = LinearScale::new((5.0, 5.0), (60.0, 0.0)).nice();
        assert_eq!(s.domain(), (5.0, 5.0));
        assert!(approx(s.map(5.0), 60.0));
    }

    #[test]
    fn test_time_scale() {
        let s = TimeScale::new(0, 120_000, (0.0, 140.0));
        assert!(approx(s.map(60_000), 70.0));
        assert!(approx(s.map(120_000), 140.0));
    }
}
