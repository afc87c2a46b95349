//! Scripted sessions.
//!
//! A script describes the pages the host has rendered and a sequence of
//! toolbar, navigation and pointer events. Running it drives a
//! [`MarkEngine`] over Vello scene surfaces and collects what the host
//! would have received.

use kurbo::{Size, Vec2};
use pagemark_core::{
    CollectingSink, ConfigError, EngineConfig, EngineEvent, ExportPayload, MarkBar, MarkCommand,
    MarkEngine, MarkStore, PageNumber, PointerEvent, ShapeKind,
};
use pagemark_render::{SceneSurface, SceneSurfaces};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
}

/// A page the host has rendered, with its overlay's pixel size and position.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSpec {
    pub page: PageNumber,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

impl PageSpec {
    fn surface(&self) -> SceneSurface {
        SceneSurface::new(Size::new(self.width, self.height))
            .with_offset(Vec2::new(self.offset_x, self.offset_y))
    }
}

/// One step of a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    /// The viewer changed its current page.
    SetPage { page: PageNumber },
    /// The host re-rendered a page's overlay.
    Render(PageSpec),
    /// The viewer scrolled a page's overlay.
    Scroll {
        page: PageNumber,
        offset_x: f64,
        offset_y: f64,
    },
    OpenToolbar,
    CloseToolbar,
    /// A shape button was pressed.
    Select { kind: ShapeKind },
    /// The delete button was pressed.
    Delete,
    /// Any other command, sent as-is.
    Command { command: MarkCommand },
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
}

/// A complete session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub config: EngineConfig,
    /// Marks present before the session starts.
    #[serde(default)]
    pub marks: MarkStore,
    #[serde(default)]
    pub pages: Vec<PageSpec>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl Script {
    /// Parse a script from JSON.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let script: Script = serde_json::from_str(json)?;
        script.config.validate()?;
        Ok(script)
    }

    /// Read and parse a script file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// What a session produced.
#[derive(Debug)]
pub struct ReplayOutcome {
    /// Export payloads in delivery order.
    pub payloads: Vec<ExportPayload>,
    /// Engine notifications in emission order.
    pub events: Vec<EngineEvent>,
    /// Toolbar state at the end of the session.
    pub toolbar: MarkBar,
    pub store: MarkStore,
}

/// Run a script to completion.
pub fn run_script(script: Script) -> Result<ReplayOutcome, ReplayError> {
    let mut surfaces = SceneSurfaces::new();
    for rendered in &script.pages {
        surfaces.insert(rendered.page, rendered.surface());
    }
    let sink = CollectingSink::new();
    let mut engine = MarkEngine::with_store(script.marks, script.config, surfaces, sink.clone())?;
    let mut toolbar = MarkBar::new();
    let mut events = Vec::new();

    for (step, event) in script.events.into_iter().enumerate() {
        log::debug!("Step {}: {:?}", step, event);
        for command in apply_event(&mut toolbar, &mut engine, event) {
            engine.handle_command(command);
        }
        for event in engine.take_events() {
            toolbar.handle_event(&event);
            events.push(event);
        }
    }

    Ok(ReplayOutcome {
        payloads: sink.take(),
        events,
        toolbar,
        store: engine.into_store(),
    })
}

/// Apply an event, returning the commands it produces.
fn apply_event(
    toolbar: &mut MarkBar,
    engine: &mut MarkEngine<SceneSurfaces>,
    event: ScriptEvent,
) -> Vec<MarkCommand> {
    match event {
        ScriptEvent::SetPage { page } => engine.set_page(page),
        ScriptEvent::Render(rendered) => {
            let mut surface = rendered.surface();
            engine.locator_mut().insert(rendered.page, surface.clone());
            if rendered.page == engine.page() {
                engine.bind(rendered.page, surface);
            } else {
                engine.paint_page(rendered.page, &mut surface);
            }
        }
        ScriptEvent::Scroll {
            page,
            offset_x,
            offset_y,
        } => match engine.locator().get(page) {
            Some(surface) => surface.set_offset(Vec2::new(offset_x, offset_y)),
            None => log::warn!("Scrolled page {} has no surface", page),
        },
        ScriptEvent::OpenToolbar => toolbar.open(),
        ScriptEvent::CloseToolbar => return toolbar.close(),
        ScriptEvent::Select { kind } => return vec![toolbar.select(kind)],
        ScriptEvent::Delete => return toolbar.delete().into_iter().collect(),
        ScriptEvent::Command { command } => return vec![command],
        ScriptEvent::Down { x, y } => engine.handle_pointer(PointerEvent::down(x, y)),
        ScriptEvent::Move { x, y } => engine.handle_pointer(PointerEvent::moved(x, y)),
        ScriptEvent::Up { x, y } => engine.handle_pointer(PointerEvent::up(x, y)),
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::ExportScope;

    const SESSION: &str = r#"{
        "pages": [
            {"page": 1, "width": 1000, "height": 1000},
            {"page": 3, "width": 1000, "height": 1000, "offset_y": 50}
        ],
        "events": [
            {"type": "set_page", "page": 1},
            {"type": "open_toolbar"},
            {"type": "select", "kind": 0},
            {"type": "down", "x": 100, "y": 500},
            {"type": "move", "x": 400, "y": 500},
            {"type": "up", "x": 400, "y": 500},
            {"type": "set_page", "page": 3},
            {"type": "select", "kind": 2},
            {"type": "down", "x": 600, "y": 750},
            {"type": "move", "x": 200, "y": 350},
            {"type": "up", "x": 200, "y": 350},
            {"type": "command", "command": {"type": "export_all"}}
        ]
    }"#;

    #[test]
    fn test_session_exports_all_pages() {
        let outcome = run_script(Script::from_json(SESSION).unwrap()).unwrap();

        assert_eq!(outcome.payloads.len(), 1);
        let payload = &outcome.payloads[0];
        assert_eq!(payload.scope, ExportScope::All);
        assert_eq!(payload.data.len(), 2);

        let line = &payload.data[0].marks[0];
        assert_eq!(line.shape_kind, ShapeKind::HorizontalLine);
        assert_eq!([line.start_x, line.end_x], [0.1, 0.4]);

        // Page 3 sits 50px down the viewport and was dragged bottom-right to top-left.
        let rect = &payload.data[1].marks[0];
        assert_eq!(payload.data[1].page, 3);
        assert_eq!(
            [rect.start_x, rect.start_y, rect.end_x, rect.end_y],
            [0.2, 0.3, 0.6, 0.7]
        );
        assert_eq!(
            outcome.events.last(),
            Some(&EngineEvent::Exported {
                scope: ExportScope::All
            })
        );
    }

    #[test]
    fn test_delete_follows_toolbar_state() {
        let json = r#"{
            "pages": [{"page": 1, "width": 1000, "height": 1000}],
            "events": [
                {"type": "set_page", "page": 1},
                {"type": "open_toolbar"},
                {"type": "select", "kind": 1},
                {"type": "down", "x": 300, "y": 100},
                {"type": "move", "x": 300, "y": 600},
                {"type": "up", "x": 300, "y": 600},
                {"type": "delete"},
                {"type": "down", "x": 301, "y": 300},
                {"type": "up", "x": 301, "y": 300},
                {"type": "delete"}
            ]
        }"#;
        let outcome = run_script(Script::from_json(json).unwrap()).unwrap();

        assert!(outcome.store.is_empty());
        assert!(!outcome.toolbar.delete_enabled());
        assert_eq!(
            outcome.events,
            vec![
                EngineEvent::DeleteAvailability { disabled: true },
                EngineEvent::DeleteAvailability { disabled: false },
                EngineEvent::DeleteAvailability { disabled: true },
            ]
        );
    }

    #[test]
    fn test_scroll_and_rerender() {
        let json = r#"{
            "marks": [
                {"page": 2, "marks": [{"startX": 0.1, "startY": 0.5, "endX": 0.4, "endY": 0.5, "shapeKind": 0}]}
            ],
            "pages": [{"page": 2, "width": 1000, "height": 1000}],
            "events": [
                {"type": "set_page", "page": 2},
                {"type": "open_toolbar"},
                {"type": "select", "kind": 0},
                {"type": "render", "page": 2, "width": 500, "height": 500},
                {"type": "scroll", "page": 2, "offset_x": 0, "offset_y": -100},
                {"type": "down", "x": 100, "y": 150},
                {"type": "up", "x": 100, "y": 150},
                {"type": "close_toolbar"},
                {"type": "command", "command": {"type": "export_current"}}
            ]
        }"#;
        let outcome = run_script(Script::from_json(json).unwrap()).unwrap();

        // The press hit the stored line on the re-rendered, scrolled overlay.
        assert!(
            outcome
                .events
                .contains(&EngineEvent::DeleteAvailability { disabled: false })
        );
        assert!(!outcome.toolbar.is_open());
        assert_eq!(outcome.toolbar.shape_kind(), ShapeKind::None);
        assert_eq!(outcome.payloads[0].data[0].page, 2);
        assert_eq!(outcome.store.len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let json = r#"{"config": {"hit_tolerance_px": -1.0}, "pages": [], "events": []}"#;
        assert!(matches!(
            Script::from_json(json),
            Err(ReplayError::Config(_))
        ));
    }

    #[test]
    fn test_unvalidated_script_config_is_rejected() {
        let script = Script {
            config: EngineConfig {
                fraction_decimals: 400,
                ..EngineConfig::default()
            },
            ..Script::default()
        };
        assert!(matches!(run_script(script), Err(ReplayError::Config(_))));
    }

    #[test]
    fn test_unknown_event_is_a_parse_error() {
        let json = r#"{"events": [{"type": "teleport"}]}"#;
        assert!(matches!(Script::from_json(json), Err(ReplayError::Parse(_))));
    }
}
