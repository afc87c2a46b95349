//! Drawing surface capability.
//!
//! The engine never talks to a concrete canvas. Hosts implement [`Surface`]
//! for their page overlay and [`SurfaceLocator`] to find a page's overlay by
//! page number.

use crate::mark::PageNumber;
use kurbo::{Line, Rect, Size, Vec2};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A per-page raster overlay the engine draws strokes on.
///
/// Implementations are handles: clones refer to the same underlying surface.
pub trait Surface {
    /// Size in pixels.
    fn size(&self) -> Size;

    /// Top-left corner of the surface in viewport coordinates.
    fn viewport_offset(&self) -> Vec2;

    /// Erase everything drawn.
    fn clear(&mut self);

    /// Stroke a line segment (pixel coordinates).
    fn stroke_line(&mut self, line: Line, width: f64);

    /// Stroke a rectangle outline (pixel coordinates).
    fn stroke_rect(&mut self, rect: Rect, width: f64);

    /// Raise the surface above sibling page content so it receives pointer
    /// events first, or restore its baseline stacking order.
    fn set_raised(&mut self, raised: bool);
}

/// Finds the surface currently rendered for a page.
pub trait SurfaceLocator {
    type Surface: Surface;

    /// Returns `None` if the host has not rendered the page.
    fn locate(&self, page: PageNumber) -> Option<Self::Surface>;
}

/// A recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOp {
    Line { line: Line, width: f64 },
    Rect { rect: Rect, width: f64 },
}

impl DrawOp {
    pub fn width(&self) -> f64 {
        match self {
            DrawOp::Line { width, .. } | DrawOp::Rect { width, .. } => *width,
        }
    }
}

#[derive(Debug)]
struct MemoryCanvas {
    size: Size,
    offset: Vec2,
    ops: Vec<DrawOp>,
    clears: usize,
    raised: bool,
}

/// In-memory surface that records what is currently drawn.
///
/// `clear` drops the recorded operations, so `ops()` always reflects the
/// visible content.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    inner: Rc<RefCell<MemoryCanvas>>,
}

impl MemorySurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryCanvas {
                size: Size::new(width, height),
                offset: Vec2::ZERO,
                ops: Vec::new(),
                clears: 0,
                raised: false,
            })),
        }
    }

    /// Place the surface at a viewport offset.
    pub fn with_offset(self, x: f64, y: f64) -> Self {
        self.set_offset(x, y);
        self
    }

    /// Move the surface, as scrolling the host page would.
    pub fn set_offset(&self, x: f64, y: f64) {
        self.inner.borrow_mut().offset = Vec2::new(x, y);
    }

    /// Draw operations since the last clear.
    pub fn ops(&self) -> Vec<DrawOp> {
        self.inner.borrow().ops.clone()
    }

    pub fn is_blank(&self) -> bool {
        self.inner.borrow().ops.is_empty()
    }

    /// Number of times the surface was cleared.
    pub fn clear_count(&self) -> usize {
        self.inner.borrow().clears
    }

    pub fn is_raised(&self) -> bool {
        self.inner.borrow().raised
    }

    /// Whether two handles refer to the same surface.
    pub fn ptr_eq(&self, other: &MemorySurface) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> Size {
        self.inner.borrow().size
    }

    fn viewport_offset(&self) -> Vec2 {
        self.inner.borrow().offset
    }

    fn clear(&mut self) {
        let mut canvas = self.inner.borrow_mut();
        canvas.ops.clear();
        canvas.clears += 1;
    }

    fn stroke_line(&mut self, line: Line, width: f64) {
        self.inner.borrow_mut().ops.push(DrawOp::Line { line, width });
    }

    fn stroke_rect(&mut self, rect: Rect, width: f64) {
        self.inner.borrow_mut().ops.push(DrawOp::Rect { rect, width });
    }

    fn set_raised(&mut self, raised: bool) {
        self.inner.borrow_mut().raised = raised;
    }
}

/// Page-number lookup over in-memory surfaces.
#[derive(Debug, Clone, Default)]
pub struct MemorySurfaces {
    surfaces: HashMap<PageNumber, MemorySurface>,
}

impl MemorySurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the surface of a page.
    pub fn insert(&mut self, page: PageNumber, surface: MemorySurface) -> Option<MemorySurface> {
        self.surfaces.insert(page, surface)
    }

    pub fn remove(&mut self, page: PageNumber) -> Option<MemorySurface> {
        self.surfaces.remove(&page)
    }

    pub fn get(&self, page: PageNumber) -> Option<&MemorySurface> {
        self.surfaces.get(&page)
    }
}

impl SurfaceLocator for MemorySurfaces {
    type Surface = MemorySurface;

    fn locate(&self, page: PageNumber) -> Option<MemorySurface> {
        self.surfaces.get(&page).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_memory_surface_records_and_clears() {
        let surface = MemorySurface::new(100.0, 50.0);
        let mut handle = surface.clone();
        handle.stroke_line(Line::new(Point::ZERO, Point::new(10.0, 0.0)), 1.0);
        handle.stroke_rect(Rect::new(1.0, 1.0, 5.0, 5.0), 5.0);

        assert_eq!(surface.ops().len(), 2);
        assert_eq!(surface.ops()[1].width(), 5.0);

        handle.clear();
        assert!(surface.is_blank());
        assert_eq!(surface.clear_count(), 1);
        assert_eq!(surface.size(), Size::new(100.0, 50.0));
    }

    #[test]
    fn test_locator_returns_shared_handles() {
        let mut surfaces = MemorySurfaces::new();
        let page = MemorySurface::new(10.0, 10.0).with_offset(4.0, 8.0);
        surfaces.insert(2, page.clone());

        let mut found = surfaces.locate(2).unwrap();
        assert!(found.ptr_eq(&page));
        assert_eq!(found.viewport_offset(), Vec2::new(4.0, 8.0));
        found.set_raised(true);
        assert!(page.is_raised());
        assert!(surfaces.locate(1).is_none());
    }
}
