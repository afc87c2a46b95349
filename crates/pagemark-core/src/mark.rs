//! Mark entity.

use crate::geometry::CalcRect;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Engine-local identifier for a mark. Never exported.
pub type MarkId = Uuid;

/// One-based document page number.
pub type PageNumber = u32;

/// The kind of shape a mark represents, and the active drawing mode.
///
/// Serialized as the numeric codes the host application expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum ShapeKind {
    /// No shape; drawing is disarmed.
    #[default]
    None,
    HorizontalLine,
    VerticalLine,
    Rectangle,
}

/// Returned when a wire code does not name a shape kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown shape kind code: {0}")]
pub struct UnknownShapeKind(pub i8);

impl ShapeKind {
    /// Wire code of this kind.
    pub fn code(self) -> i8 {
        match self {
            ShapeKind::None => -1,
            ShapeKind::HorizontalLine => 0,
            ShapeKind::VerticalLine => 1,
            ShapeKind::Rectangle => 2,
        }
    }

    pub fn is_none(self) -> bool {
        self == ShapeKind::None
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::None => "None",
            ShapeKind::HorizontalLine => "Horizontal line",
            ShapeKind::VerticalLine => "Vertical line",
            ShapeKind::Rectangle => "Rectangle",
        }
    }
}

impl From<ShapeKind> for i8 {
    fn from(kind: ShapeKind) -> Self {
        kind.code()
    }
}

impl TryFrom<i8> for ShapeKind {
    type Error = UnknownShapeKind;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(ShapeKind::None),
            0 => Ok(ShapeKind::HorizontalLine),
            1 => Ok(ShapeKind::VerticalLine),
            2 => Ok(ShapeKind::Rectangle),
            other => Err(UnknownShapeKind(other)),
        }
    }
}

/// A committed annotation shape in fractional page coordinates.
///
/// Coordinates are ratios of the page surface's width and height, so a mark
/// stays valid when the host re-renders the page at a different zoom.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    #[serde(skip, default = "Uuid::new_v4")]
    pub(crate) id: MarkId,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub shape_kind: ShapeKind,
}

impl Mark {
    /// Create a mark from two fractional points.
    pub fn new(shape_kind: ShapeKind, start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            shape_kind,
        }
    }

    pub fn id(&self) -> MarkId {
        self.id
    }

    pub fn start(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }

    pub fn end(&self) -> Point {
        Point::new(self.end_x, self.end_y)
    }

    /// Order the end points so the start is top-left of the end.
    ///
    /// Each axis is swapped independently, which covers every drag direction.
    pub fn canonicalize(&mut self) {
        if self.start_x > self.end_x {
            std::mem::swap(&mut self.start_x, &mut self.end_x);
        }
        if self.start_y > self.end_y {
            std::mem::swap(&mut self.start_y, &mut self.end_y);
        }
    }

    /// Whether both axes are in top-left/bottom-right order.
    pub fn is_canonical(&self) -> bool {
        self.start_x <= self.end_x && self.start_y <= self.end_y
    }

    /// Whether every coordinate is a fraction in `[0, 1]`.
    pub fn is_on_page(&self) -> bool {
        [self.start_x, self.start_y, self.end_x, self.end_y]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    /// Project to `{x, y, width, height}` in fraction space.
    ///
    /// Horizontal lines have zero height and vertical lines zero width.
    pub fn to_calc_rect(&self) -> Option<CalcRect> {
        let width = self.end_x - self.start_x;
        let height = self.end_y - self.start_y;
        let (width, height) = match self.shape_kind {
            ShapeKind::None => return None,
            ShapeKind::HorizontalLine => (width, 0.0),
            ShapeKind::VerticalLine => (0.0, height),
            ShapeKind::Rectangle => (width, height),
        };
        Some(CalcRect {
            x: self.start_x,
            y: self.start_y,
            width,
            height,
        })
    }

    /// Compare the exported fields, ignoring the engine-local id.
    pub fn same_geometry(&self, other: &Mark) -> bool {
        self.shape_kind == other.shape_kind
            && self.start_x == other.start_x
            && self.start_y == other.start_y
            && self.end_x == other.end_x
            && self.end_y == other.end_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_kind_codes() {
        for kind in [
            ShapeKind::None,
            ShapeKind::HorizontalLine,
            ShapeKind::VerticalLine,
            ShapeKind::Rectangle,
        ] {
            assert_eq!(ShapeKind::try_from(kind.code()), Ok(kind));
        }
        assert_eq!(ShapeKind::try_from(7), Err(UnknownShapeKind(7)));
    }

    #[test]
    fn test_shape_kind_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ShapeKind::Rectangle).unwrap(), "2");
        let kind: ShapeKind = serde_json::from_str("-1").unwrap();
        assert_eq!(kind, ShapeKind::None);
        assert!(serde_json::from_str::<ShapeKind>("9").is_err());
    }

    #[test]
    fn test_canonicalize_both_axes_reversed() {
        let mut mark = Mark::new(
            ShapeKind::Rectangle,
            Point::new(0.6, 0.7),
            Point::new(0.2, 0.3),
        );
        mark.canonicalize();
        assert_eq!(mark.start(), Point::new(0.2, 0.3));
        assert_eq!(mark.end(), Point::new(0.6, 0.7));
    }

    #[test]
    fn test_canonicalize_mixed_directions() {
        // Dragged right-to-left but top-to-bottom.
        let mut mark = Mark::new(
            ShapeKind::Rectangle,
            Point::new(0.6, 0.3),
            Point::new(0.2, 0.7),
        );
        mark.canonicalize();
        assert_eq!(mark.start(), Point::new(0.2, 0.3));
        assert_eq!(mark.end(), Point::new(0.6, 0.7));

        let mut mark = Mark::new(
            ShapeKind::Rectangle,
            Point::new(0.2, 0.7),
            Point::new(0.6, 0.3),
        );
        mark.canonicalize();
        assert!(mark.is_canonical());
        assert_eq!(mark.start(), Point::new(0.2, 0.3));
    }

    #[test]
    fn test_calc_rect_projection() {
        let line = Mark::new(
            ShapeKind::HorizontalLine,
            Point::new(0.1, 0.5),
            Point::new(0.4, 0.5),
        );
        let rect = line.to_calc_rect().unwrap();
        assert!((rect.width - 0.3).abs() < 1e-12);
        assert_eq!(rect.height, 0.0);

        let line = Mark::new(
            ShapeKind::VerticalLine,
            Point::new(0.1, 0.2),
            Point::new(0.1, 0.9),
        );
        let rect = line.to_calc_rect().unwrap();
        assert_eq!(rect.width, 0.0);
        assert!((rect.height - 0.7).abs() < 1e-12);

        let none = Mark::new(ShapeKind::None, Point::ZERO, Point::new(1.0, 1.0));
        assert!(none.to_calc_rect().is_none());
    }

    #[test]
    fn test_mark_wire_format_has_no_id() {
        let mark = Mark::new(
            ShapeKind::VerticalLine,
            Point::new(0.25, 0.1),
            Point::new(0.25, 0.5),
        );
        let json = serde_json::to_value(&mark).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "startX": 0.25,
                "startY": 0.1,
                "endX": 0.25,
                "endY": 0.5,
                "shapeKind": 1
            })
        );
        let back: Mark = serde_json::from_value(json).unwrap();
        assert!(back.same_geometry(&mark));
        assert_ne!(back.id(), mark.id());
    }
}
