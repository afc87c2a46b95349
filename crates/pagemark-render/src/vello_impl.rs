//! Vello-backed mark surface.

use crate::style::MarkStyle;
use kurbo::{Affine, Line, Rect, Size, Stroke, Vec2};
use pagemark_core::{PageNumber, Surface, SurfaceLocator};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use vello::Scene;

struct SceneState {
    scene: Scene,
    size: Size,
    offset: Vec2,
    raised: bool,
    style: MarkStyle,
    /// Strokes recorded since the last clear.
    strokes: usize,
}

/// A page overlay that records marks into a Vello scene.
///
/// Cloning yields another handle to the same scene, so the host keeps one
/// to present while the engine draws through another.
#[derive(Clone)]
pub struct SceneSurface {
    state: Rc<RefCell<SceneState>>,
}

impl SceneSurface {
    /// Create a surface covering a page rendered at `size` pixels.
    pub fn new(size: Size) -> Self {
        Self {
            state: Rc::new(RefCell::new(SceneState {
                scene: Scene::new(),
                size,
                offset: Vec2::ZERO,
                raised: false,
                style: MarkStyle::default(),
                strokes: 0,
            })),
        }
    }

    /// Set the stroke style.
    pub fn with_style(self, style: MarkStyle) -> Self {
        self.state.borrow_mut().style = style;
        self
    }

    /// Set the surface's position in the viewport.
    pub fn with_offset(self, offset: Vec2) -> Self {
        self.set_offset(offset);
        self
    }

    /// Move the surface, e.g. after the viewer scrolled.
    pub fn set_offset(&self, offset: Vec2) {
        self.state.borrow_mut().offset = offset;
    }

    /// Record a new page size after the host re-rendered the page.
    ///
    /// The engine only picks this up on its next bind.
    pub fn resize(&self, size: Size) {
        let mut state = self.state.borrow_mut();
        state.size = size;
        state.scene.reset();
        state.strokes = 0;
    }

    pub fn is_raised(&self) -> bool {
        self.state.borrow().raised
    }

    /// Stacking order the host should apply to this overlay.
    pub fn z_index(&self) -> i32 {
        let state = self.state.borrow();
        state.style.z_index(state.raised)
    }

    /// Number of strokes in the current scene.
    pub fn stroke_count(&self) -> usize {
        self.state.borrow().strokes
    }

    /// Run `f` with the recorded scene, e.g. to append it to a frame.
    pub fn with_scene<R>(&self, f: impl FnOnce(&Scene) -> R) -> R {
        f(&self.state.borrow().scene)
    }

    fn stroke_shape(&mut self, shape: &impl kurbo::Shape, width: f64) {
        let mut state = self.state.borrow_mut();
        let color = state.style.stroke_color;
        state
            .scene
            .stroke(&Stroke::new(width), Affine::IDENTITY, color, None, shape);
        state.strokes += 1;
    }
}

impl Surface for SceneSurface {
    fn size(&self) -> Size {
        self.state.borrow().size
    }

    fn viewport_offset(&self) -> Vec2 {
        self.state.borrow().offset
    }

    fn clear(&mut self) {
        let mut state = self.state.borrow_mut();
        state.scene.reset();
        state.strokes = 0;
    }

    fn stroke_line(&mut self, line: Line, width: f64) {
        self.stroke_shape(&line, width);
    }

    fn stroke_rect(&mut self, rect: Rect, width: f64) {
        self.stroke_shape(&rect, width);
    }

    fn set_raised(&mut self, raised: bool) {
        self.state.borrow_mut().raised = raised;
    }
}

/// Scene surfaces for the pages the host has rendered.
#[derive(Clone, Default)]
pub struct SceneSurfaces {
    pages: HashMap<PageNumber, SceneSurface>,
}

impl SceneSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the surface for a rendered page, replacing any previous one.
    pub fn insert(&mut self, page: PageNumber, surface: SceneSurface) -> Option<SceneSurface> {
        log::debug!("Registered scene surface for page {}", page);
        self.pages.insert(page, surface)
    }

    /// Forget a page the host unloaded.
    pub fn remove(&mut self, page: PageNumber) -> Option<SceneSurface> {
        self.pages.remove(&page)
    }

    pub fn get(&self, page: PageNumber) -> Option<&SceneSurface> {
        self.pages.get(&page)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl SurfaceLocator for SceneSurfaces {
    type Surface = SceneSurface;

    fn locate(&self, page: PageNumber) -> Option<SceneSurface> {
        self.pages.get(&page).cloned()
    }
}
