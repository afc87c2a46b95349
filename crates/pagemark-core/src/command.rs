//! Typed commands from the toolbar and notifications back to it.

use crate::export::ExportScope;
use crate::mark::ShapeKind;
use serde::{Deserialize, Serialize};

/// A high-level intent for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkCommand {
    /// Arm drawing with a shape kind, or disarm with `ShapeKind::None`.
    SetShapeKind { kind: ShapeKind },
    /// The drawing feature was closed; release the surface.
    Disable,
    /// Remove the most recently drawn mark on the current page.
    Undo,
    /// Remove the selected mark.
    Delete,
    /// Remove every mark on the current page.
    ClearPage,
    /// Remove every mark in the document.
    ClearAll,
    /// Deliver the whole document's marks to the host.
    ExportAll,
    /// Deliver the current page's marks to the host.
    ExportCurrent,
}

impl MarkCommand {
    /// Whether the command edits or reads the mark store (and is followed by a redraw).
    pub fn is_operation(&self) -> bool {
        !matches!(self, MarkCommand::SetShapeKind { .. } | MarkCommand::Disable)
    }
}

/// Notifications emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Whether the toolbar's delete affordance should be disabled.
    DeleteAvailability { disabled: bool },
    /// An export payload was handed to the host.
    Exported { scope: ExportScope },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json() {
        let command: MarkCommand =
            serde_json::from_str(r#"{"type": "set_shape_kind", "kind": 2}"#).unwrap();
        assert_eq!(
            command,
            MarkCommand::SetShapeKind {
                kind: ShapeKind::Rectangle
            }
        );
        let command: MarkCommand = serde_json::from_str(r#"{"type": "clear_all"}"#).unwrap();
        assert_eq!(command, MarkCommand::ClearAll);
    }

    #[test]
    fn test_event_json() {
        let json = serde_json::to_value(EngineEvent::DeleteAvailability { disabled: true }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "delete_availability", "disabled": true})
        );
    }

    #[test]
    fn test_is_operation() {
        assert!(MarkCommand::Undo.is_operation());
        assert!(MarkCommand::ExportAll.is_operation());
        assert!(!MarkCommand::Disable.is_operation());
        assert!(!MarkCommand::SetShapeKind {
            kind: ShapeKind::None
        }
        .is_operation());
    }
}
