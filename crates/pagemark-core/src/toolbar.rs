//! Toolbar state model.
//!
//! Tracks what the drawing toolbar shows and turns button presses into
//! [`MarkCommand`]s. Rendering the toolbar is up to the host.

use crate::command::{EngineEvent, MarkCommand};
use crate::mark::ShapeKind;

/// State of the mark toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkBar {
    opened: bool,
    shape_kind: ShapeKind,
    delete_enabled: bool,
}

impl Default for MarkBar {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkBar {
    /// A closed toolbar with no shape kind and delete disabled.
    pub fn new() -> Self {
        Self {
            opened: false,
            shape_kind: ShapeKind::None,
            delete_enabled: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.shape_kind
    }

    pub fn delete_enabled(&self) -> bool {
        self.delete_enabled
    }

    /// Show the toolbar. Opening does not arm a shape kind.
    pub fn open(&mut self) {
        self.opened = true;
    }

    /// Hide the toolbar, disarming drawing and releasing the surface.
    pub fn close(&mut self) -> Vec<MarkCommand> {
        if !self.opened {
            return Vec::new();
        }
        self.opened = false;
        self.shape_kind = ShapeKind::None;
        vec![
            MarkCommand::SetShapeKind {
                kind: ShapeKind::None,
            },
            MarkCommand::Disable,
        ]
    }

    pub fn toggle(&mut self) -> Vec<MarkCommand> {
        if self.opened {
            self.close()
        } else {
            self.open();
            Vec::new()
        }
    }

    /// Press a shape button. Pressing the active kind again disarms it.
    pub fn select(&mut self, kind: ShapeKind) -> MarkCommand {
        self.shape_kind = if kind == self.shape_kind {
            ShapeKind::None
        } else {
            kind
        };
        MarkCommand::SetShapeKind {
            kind: self.shape_kind,
        }
    }

    pub fn undo(&self) -> MarkCommand {
        MarkCommand::Undo
    }

    /// Press delete; nothing happens while the button is disabled.
    pub fn delete(&self) -> Option<MarkCommand> {
        self.delete_enabled.then_some(MarkCommand::Delete)
    }

    pub fn clear_page(&self) -> MarkCommand {
        MarkCommand::ClearPage
    }

    pub fn clear_all(&self) -> MarkCommand {
        MarkCommand::ClearAll
    }

    pub fn export_all(&self) -> MarkCommand {
        MarkCommand::ExportAll
    }

    pub fn export_current(&self) -> MarkCommand {
        MarkCommand::ExportCurrent
    }

    /// Apply an engine notification.
    pub fn handle_event(&mut self, event: &EngineEvent) {
        if let EngineEvent::DeleteAvailability { disabled } = event {
            self.delete_enabled = !disabled;
        }
    }
}
