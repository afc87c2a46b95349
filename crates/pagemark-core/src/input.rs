//! Pointer events delivered by the host.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// A pointer event on the bound surface.
///
/// Positions are in viewport (client) coordinates; the engine subtracts the
/// surface's viewport offset itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
}

impl PointerEvent {
    pub fn down(x: f64, y: f64) -> Self {
        PointerEvent::Down {
            position: Point::new(x, y),
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        PointerEvent::Move {
            position: Point::new(x, y),
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        PointerEvent::Up {
            position: Point::new(x, y),
        }
    }

    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position } => *position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event: PointerEvent =
            serde_json::from_str(r#"{"type": "down", "position": {"x": 3.0, "y": 4.0}}"#).unwrap();
        assert_eq!(event, PointerEvent::down(3.0, 4.0));
        assert_eq!(event.position(), Point::new(3.0, 4.0));
    }
}
