//! Trend line geometry for a circuit's rolling series
//!
//! x: sample time within a fixed 2 minute lookback ending at `now`.
//! y: value on a nice linear axis spanning the observed min/max, inverted
//! so larger values sit higher. Points are joined with a uniform cubic
//! B-spline, so the curve does not pass through interior samples.

use std::fmt::Write as _;

use super::scale::{LinearScale, TimeScale};
use super::series::RollingSeries;

/// Lookback window of the trend line
pub const WINDOW_MS: i64 = 2 * 60 * 1000;
/// Viewport width in pixels
pub const WIDTH: f64 = 140.0;
/// Viewport height in pixels (y = HEIGHT is the lowest value)
pub const HEIGHT: f64 = 60.0;

pub type Point = (f64, f64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic bezier: control 1, control 2, end
    CubicTo(Point, Point, Point),
}

/// A trend line path in viewport coordinates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendPath {
    segments: Vec<PathSegment>,
}

impl TrendPath {
    /// Empty path attached to freshly created elements
    pub fn empty() -> Self {
        Self::default()
    }

    /// Lay out `series` in the window ending at `now_ms`
    pub fn from_series(series: &RollingSeries, now_ms: i64) -> Self {
        let Some((y_min, y_max)) = series.value_extent() else {
            return Self::empty();
        };
        let x_scale = TimeScale::new(now_ms - WINDOW_MS, now_ms, (0.0, WIDTH));
        let y_scale = LinearScale::new((y_min, y_max), (HEIGHT, 0.0)).nice();

        let points: Vec<Point> = series
            .samples()
            .iter()
            .map(|s| (x_scale.map(s.t), y_scale.map(s.v)))
            .collect();

        Self {
            segments: basis_curve(&points),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// SVG path data, e.g. `M0,60L1.5,50C...`
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            // Writing to a String cannot fail
            let _ = match seg {
                PathSegment::MoveTo((x, y)) => write!(out, "M{x},{y}"),
                PathSegment::LineTo((x, y)) => write!(out, "L{x},{y}"),
                PathSegment::CubicTo((x1, y1), (x2, y2), (x, y)) => {
                    write!(out, "C{x1},{y1},{x2},{y2},{x},{y}")
                }
            };
        }
        out
    }

    /// Polyline approximation, `steps` points per cubic segment
    pub fn flatten(&self, steps: usize) -> Vec<Point> {
        let steps = steps.max(1);
        let mut out = Vec::new();
        let mut cursor: Option<Point> = None;
        for seg in &self.segments {
            match *seg {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => {
                    out.push(p);
                    cursor = Some(p);
                }
                PathSegment::CubicTo(c1, c2, end) => {
                    let start = cursor.unwrap_or(c1);
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        out.push(cubic_point(start, c1, c2, end, t));
                    }
                    cursor = Some(end);
                }
            }
        }
        out
    }
}

fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    (
        a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
        a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
    )
}

/// Uniform cubic B-spline through `points`, clamped at both ends.
///
/// One point yields a bare move; two points a straight line.
fn basis_curve(points: &[Point]) -> Vec<PathSegment> {
    let mut out = Vec::with_capacity(points.len() + 2);
    let Some(&first) = points.first() else {
        return out;
    };
    out.push(PathSegment::MoveTo(first));

    match points.len() {
        1 => return out,
        2 => {
            out.push(PathSegment::LineTo(points[1]));
            return out;
        }
        _ => {}
    }

    let (mut p0, mut p1) = (points[0], points[1]);
    out.push(PathSegment::LineTo((
        (5.0 * p0.0 + p1.0) / 6.0,
        (5.0 * p0.1 + p1.1) / 6.0,
    )));
    for &p in &points[2..] {
        out.push(basis_segment(p0, p1, p));
        p0 = p1;
        p1 = p;
    }
    // Close on the last point
    out.push(basis_segment(p0, p1, p1));
    out.push(PathSegment::LineTo(p1));
    out
}

fn basis_segment(p0: Point, p1: Point, p: Point) -> PathSegment {
    PathSegment::CubicTo(
        ((2.0 * p0.0 + p1.0) / 3.0, (2.0 * p0.1 + p1.1) / 3.0),
        ((p0.0 + 2.0 * p1.0) / 3.0, (p0.1 + 2.0 * p1.1) / 3.0),
        ((p0.0 + 4.0 * p1.0 + p.0) / 6.0, (p0.1 + 4.0 * p1.1 + p.1) / 6.0),
    )
}
