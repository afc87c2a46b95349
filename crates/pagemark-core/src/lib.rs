//! Pagemark Core Library
//!
//! Platform-agnostic data model and interaction engine for drawing ruling
//! marks (horizontal lines, vertical lines, rectangles) over the pages of a
//! document viewer.

pub mod command;
pub mod config;
pub mod engine;
pub mod export;
pub mod geometry;
pub mod input;
pub mod mark;
pub mod store;
pub mod surface;
pub mod toolbar;

pub use command::{EngineEvent, MarkCommand};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Draft, GestureState, MarkEngine};
pub use export::{CollectingSink, ExportError, ExportPayload, ExportScope, ExportSink};
pub use geometry::{CalcRect, PixelMark};
pub use input::PointerEvent;
pub use mark::{Mark, MarkId, PageNumber, ShapeKind, UnknownShapeKind};
pub use store::{MarkStore, PageMarkSet};
pub use surface::{DrawOp, MemorySurface, MemorySurfaces, Surface, SurfaceLocator};
pub use toolbar::MarkBar;
