//! Coordinate conversion and hit-testing.
//!
//! Marks are stored as page fractions. Every pixel-space operation re-derives
//! pixel coordinates from the fractions against the current surface size, so
//! nothing cached goes stale when the host resizes the surface.

use crate::mark::{Mark, ShapeKind};
use kurbo::{Line, Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// A mark projected to `{x, y, width, height}` in fraction space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalcRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Round `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Convert a surface-local pixel point to page fractions.
///
/// Returns `None` for a degenerate surface.
pub fn to_fraction(pixel: Point, size: Size, decimals: u32) -> Option<Point> {
    if size.width <= 0.0 || size.height <= 0.0 {
        return None;
    }
    Some(Point::new(
        round_to(pixel.x / size.width, decimals),
        round_to(pixel.y / size.height, decimals),
    ))
}

/// Convert a fractional point to whole surface pixels.
pub fn to_pixels(fraction: Point, size: Size) -> Point {
    Point::new(
        (fraction.x * size.width).round(),
        (fraction.y * size.height).round(),
    )
}

/// A mark re-derived in pixel space for one surface size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMark {
    pub kind: ShapeKind,
    pub start: Point,
    pub end: Point,
}

impl PixelMark {
    pub fn new(kind: ShapeKind, start: Point, end: Point) -> Self {
        Self { kind, start, end }
    }

    pub fn from_mark(mark: &Mark, size: Size) -> Self {
        Self {
            kind: mark.shape_kind,
            start: to_pixels(mark.start(), size),
            end: to_pixels(mark.end(), size),
        }
    }

    pub fn as_line(&self) -> Line {
        Line::new(self.start, self.end)
    }

    pub fn as_rect(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    /// Check if a pixel point lies within `tolerance` of this mark's stroke.
    ///
    /// Rectangles only hit on their four edges; the interior is not a hit.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let (s, e) = (self.start, self.end);
        match self.kind {
            ShapeKind::HorizontalLine => {
                within(point.x, s.x, e.x, tolerance)
                    && near(point.y, s.y, tolerance)
                    && near(point.y, e.y, tolerance)
            }
            ShapeKind::VerticalLine => {
                within(point.y, s.y, e.y, tolerance)
                    && near(point.x, s.x, tolerance)
                    && near(point.x, e.x, tolerance)
            }
            ShapeKind::Rectangle => {
                let on_top = within(point.x, s.x, e.x, tolerance) && near(point.y, s.y, tolerance);
                let on_bottom =
                    within(point.x, s.x, e.x, tolerance) && near(point.y, e.y, tolerance);
                let on_left = within(point.y, s.y, e.y, tolerance) && near(point.x, s.x, tolerance);
                let on_right =
                    within(point.y, s.y, e.y, tolerance) && near(point.x, e.x, tolerance);
                on_top || on_bottom || on_left || on_right
            }
            ShapeKind::None => false,
        }
    }
}

fn near(value: f64, target: f64, tolerance: f64) -> bool {
    (value - target).abs() <= tolerance
}

fn within(value: f64, a: f64, b: f64, tolerance: f64) -> bool {
    value >= a.min(b) - tolerance && value <= a.max(b) + tolerance
}

/// Find the topmost mark hit by a pixel point.
///
/// The most recently appended mark wins when several overlap.
pub fn topmost_hit<'a>(
    marks: &'a [Mark],
    size: Size,
    point: Point,
    tolerance: f64,
) -> Option<&'a Mark> {
    marks
        .iter()
        .rev()
        .find(|mark| PixelMark::from_mark(mark, size).hit_test(point, tolerance))
}
