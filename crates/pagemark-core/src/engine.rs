//! The mark engine.
//!
//! Owns the document's marks, binds to one page surface at a time, turns
//! pointer gestures into marks, hit-tests presses against existing marks and
//! repaints the bound surface.

use crate::command::{EngineEvent, MarkCommand};
use crate::config::{ConfigError, EngineConfig};
use crate::export::{ExportPayload, ExportScope, ExportSink};
use crate::geometry::{self, PixelMark};
use crate::input::PointerEvent;
use crate::mark::{Mark, MarkId, PageNumber, ShapeKind};
use crate::store::{MarkStore, PageMarkSet};
use crate::surface::{Surface, SurfaceLocator};
use kurbo::{Point, Size, Vec2};

/// Where the engine is in a pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    /// No shape kind is active; pointer events are ignored.
    Disarmed,
    Idle,
    Dragging,
}

/// An unfinalized mark being dragged out, in page fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draft {
    pub kind: ShapeKind,
    pub start: Point,
    /// `None` until the pointer moves.
    pub end: Option<Point>,
}

impl Draft {
    pub fn new(kind: ShapeKind, start: Point) -> Self {
        Self {
            kind,
            start,
            end: None,
        }
    }

    /// Follow the pointer, pinning the axis a line kind does not move along.
    pub fn extend_to(&mut self, current: Point) {
        self.end = Some(match self.kind {
            ShapeKind::HorizontalLine => Point::new(current.x, self.start.y),
            ShapeKind::VerticalLine => Point::new(self.start.x, current.y),
            ShapeKind::Rectangle | ShapeKind::None => current,
        });
    }

    /// Switch to another shape kind, re-pinning the current end.
    pub fn retarget(&mut self, kind: ShapeKind) {
        if kind == self.kind {
            return;
        }
        self.kind = kind;
        if let Some(end) = self.end {
            self.extend_to(end);
        }
    }

    /// Turn the draft into a canonical mark.
    ///
    /// Returns `None` when the pointer never moved, came back to the start,
    /// or the relevant axis delta is at or below `min_size`.
    pub fn finalize(&self, min_size: f64) -> Option<Mark> {
        let end = self.end?;
        if !end.is_finite() || !self.start.is_finite() || end == self.start {
            return None;
        }
        let dx = (end.x - self.start.x).abs();
        let dy = (end.y - self.start.y).abs();
        let too_small = match self.kind {
            ShapeKind::HorizontalLine => dx <= min_size,
            ShapeKind::VerticalLine => dy <= min_size,
            ShapeKind::Rectangle => dx <= min_size || dy <= min_size,
            ShapeKind::None => true,
        };
        if too_small {
            return None;
        }
        let mut mark = Mark::new(self.kind, self.start, end);
        mark.canonicalize();
        Some(mark)
    }
}

/// The surface currently bound, with its cached geometry.
struct Binding<S> {
    surface: S,
    size: Size,
    offset: Vec2,
}

/// Interactive controller for page marks.
///
/// All calls are synchronous and expected on the host's UI thread, in the
/// order the host receives the underlying events.
pub struct MarkEngine<L: SurfaceLocator> {
    config: EngineConfig,
    store: MarkStore,
    locator: L,
    sink: Box<dyn ExportSink>,
    /// Page the engine is working on.
    page: PageNumber,
    shape_kind: ShapeKind,
    binding: Option<Binding<L::Surface>>,
    draft: Option<Draft>,
    /// Selected mark on the current page.
    selected: Option<MarkId>,
    /// Notifications not yet taken by the host.
    events: Vec<EngineEvent>,
}

impl<L: SurfaceLocator> MarkEngine<L> {
    /// Create an engine with an empty store and default configuration.
    pub fn new(locator: L, sink: impl ExportSink + 'static) -> Self {
        Self::build(MarkStore::new(), EngineConfig::default(), locator, sink)
    }

    /// Create an engine over an existing store.
    ///
    /// Fails if `config` does not pass [`EngineConfig::validate`].
    pub fn with_store(
        store: MarkStore,
        config: EngineConfig,
        locator: L,
        sink: impl ExportSink + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(store, config, locator, sink))
    }

    fn build(
        store: MarkStore,
        config: EngineConfig,
        locator: L,
        sink: impl ExportSink + 'static,
    ) -> Self {
        Self {
            config,
            store,
            locator,
            sink: Box::new(sink),
            page: 1,
            shape_kind: ShapeKind::None,
            binding: None,
            draft: None,
            selected: None,
            events: Vec::new(),
        }
    }

    pub fn store(&self) -> &MarkStore {
        &self.store
    }

    pub fn into_store(self) -> MarkStore {
        self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn page(&self) -> PageNumber {
        self.page
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.shape_kind
    }

    pub fn gesture_state(&self) -> GestureState {
        if self.shape_kind.is_none() {
            GestureState::Disarmed
        } else if self.draft.is_some() {
            GestureState::Dragging
        } else {
            GestureState::Idle
        }
    }

    /// The in-progress mark, if dragging.
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// The selected mark on the current page.
    pub fn selected(&self) -> Option<&Mark> {
        self.selected.and_then(|id| self.store.get(self.page, id))
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn bound_surface(&self) -> Option<&L::Surface> {
        self.binding.as_ref().map(|binding| &binding.surface)
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn locator_mut(&mut self) -> &mut L {
        &mut self.locator
    }

    /// Drain pending notifications.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    // --- Surface binding ---

    /// Switch to another page and bind its surface if the host rendered it.
    ///
    /// The active shape kind is kept.
    pub fn set_page(&mut self, page: PageNumber) {
        if page != self.page {
            self.leave_page();
        }
        self.detach();
        self.page = page;
        self.attach_current_page();
    }

    /// Bind a surface the host just created or replaced for `page`.
    pub fn bind(&mut self, page: PageNumber, surface: L::Surface) {
        if page != self.page {
            self.leave_page();
        }
        self.detach();
        self.page = page;
        self.attach(surface);
    }

    /// Release the surface and disarm drawing.
    pub fn unbind(&mut self) {
        self.release_selection();
        self.detach();
        self.draft = None;
        self.shape_kind = ShapeKind::None;
    }

    fn attach_current_page(&mut self) {
        match self.locator.locate(self.page) {
            Some(surface) => self.attach(surface),
            None => log::debug!("No surface rendered for page {}", self.page),
        }
    }

    fn attach(&mut self, mut surface: L::Surface) {
        let size = surface.size();
        let offset = surface.viewport_offset();
        if !self.shape_kind.is_none() {
            surface.set_raised(true);
        }
        log::info!(
            "Bound page {} surface ({}x{})",
            self.page,
            size.width,
            size.height
        );
        self.binding = Some(Binding {
            surface,
            size,
            offset,
        });
        self.redraw();
    }

    fn detach(&mut self) {
        if let Some(mut binding) = self.binding.take() {
            binding.surface.set_raised(false);
        }
    }

    fn leave_page(&mut self) {
        self.draft = None;
        self.release_selection();
    }

    /// Deselect and repaint so the bound surface stops showing the highlight.
    fn release_selection(&mut self) {
        if self.selected.is_some() {
            self.deselect();
            self.redraw();
        }
    }

    fn deselect(&mut self) {
        if self.selected.take().is_some() {
            self.emit(EngineEvent::DeleteAvailability { disabled: true });
        }
    }

    // --- Gestures ---

    /// Feed a pointer event from the bound surface.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if self.shape_kind.is_none() {
            return;
        }
        match event {
            PointerEvent::Down { position } => self.pointer_down(position),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { .. } => self.pointer_up(),
        }
    }

    fn pointer_down(&mut self, position: Point) {
        let Some(binding) = self.binding.as_mut() else {
            return;
        };
        // Scrolling moves the surface without rebinding it.
        binding.offset = binding.surface.viewport_offset();
        let local = position - binding.offset;
        let size = binding.size;

        self.draft = None;
        let hit = geometry::topmost_hit(
            self.store.marks(self.page),
            size,
            local,
            self.config.hit_tolerance_px,
        )
        .map(Mark::id);
        self.selected = hit;
        self.redraw();

        if let Some(id) = hit {
            log::debug!("Selected mark {} on page {}", id, self.page);
            self.emit(EngineEvent::DeleteAvailability { disabled: false });
            return;
        }

        self.emit(EngineEvent::DeleteAvailability { disabled: true });
        if let Some(start) = geometry::to_fraction(local, size, self.config.fraction_decimals) {
            self.draft = Some(Draft::new(self.shape_kind, start));
        }
    }

    fn pointer_move(&mut self, position: Point) {
        let (Some(draft), Some(binding)) = (self.draft.as_mut(), self.binding.as_ref()) else {
            return;
        };
        let local = position - binding.offset;
        let Some(current) =
            geometry::to_fraction(local, binding.size, self.config.fraction_decimals)
        else {
            return;
        };
        draft.retarget(self.shape_kind);
        draft.extend_to(current);
        let draft = *draft;
        self.draw_preview(&draft);
    }

    fn pointer_up(&mut self) {
        let Some(mut draft) = self.draft.take() else {
            return;
        };
        draft.retarget(self.shape_kind);
        match draft.finalize(self.config.min_mark_size) {
            Some(mark) => {
                log::debug!(
                    "Committed {} on page {}",
                    mark.shape_kind.name(),
                    self.page
                );
                self.store.push(self.page, mark);
            }
            None => log::debug!(
                "Discarded {} gesture on page {}",
                draft.kind.name(),
                self.page
            ),
        }
        // Also wipes the preview of a discarded gesture.
        self.redraw();
    }

    fn draw_preview(&mut self, draft: &Draft) {
        let Some(end) = draft.end else {
            return;
        };
        // A rectangle outline can't be extended in place like a line.
        if draft.kind == ShapeKind::Rectangle {
            self.redraw();
        }
        let Some(binding) = self.binding.as_mut() else {
            return;
        };
        let preview = PixelMark::new(
            draft.kind,
            geometry::to_pixels(draft.start, binding.size),
            geometry::to_pixels(end, binding.size),
        );
        paint(&mut binding.surface, &preview, self.config.line_width);
    }

    // --- Rendering ---

    /// Repaint the bound surface with the current page's marks.
    pub fn redraw(&mut self) {
        let Some(binding) = self.binding.as_mut() else {
            return;
        };
        binding.surface.clear();
        for mark in self.store.marks(self.page) {
            let width = if self.selected == Some(mark.id()) {
                self.config.selected_line_width
            } else {
                self.config.line_width
            };
            paint(
                &mut binding.surface,
                &PixelMark::from_mark(mark, binding.size),
                width,
            );
        }
    }

    /// Paint a page's stored marks onto a surface the engine is not bound to.
    ///
    /// Used when the host re-renders a page other than the current one.
    pub fn paint_page(&self, page: PageNumber, surface: &mut L::Surface) {
        let size = surface.size();
        surface.clear();
        for mark in self.store.marks(page) {
            paint(
                surface,
                &PixelMark::from_mark(mark, size),
                self.config.line_width,
            );
        }
    }

    // --- Commands ---

    /// Apply a toolbar command.
    pub fn handle_command(&mut self, command: MarkCommand) {
        log::debug!("{:?} on page {}", command, self.page);
        match command {
            MarkCommand::SetShapeKind { kind } => self.set_shape_kind(kind),
            MarkCommand::Disable => self.unbind(),
            MarkCommand::Undo => {
                let popped = self.store.pop(self.page).map(|mark| mark.id());
                if popped.is_some() && popped == self.selected {
                    self.deselect();
                }
            }
            MarkCommand::Delete => {
                if let Some(id) = self.selected {
                    self.store.remove(self.page, id);
                    self.deselect();
                }
            }
            MarkCommand::ClearPage => {
                if self.store.clear_page(self.page).is_some() {
                    self.deselect();
                }
            }
            MarkCommand::ClearAll => self.clear_all(),
            MarkCommand::ExportAll => self.export(ExportScope::All),
            MarkCommand::ExportCurrent => self.export(ExportScope::Current),
        }
        if command.is_operation() {
            self.redraw();
        }
    }

    fn set_shape_kind(&mut self, kind: ShapeKind) {
        if kind.is_none() {
            self.unbind();
            return;
        }
        self.shape_kind = kind;
        match self.binding.as_mut() {
            Some(binding) => binding.surface.set_raised(true),
            None => self.attach_current_page(),
        }
    }

    fn clear_all(&mut self) {
        let cleared = self.store.clear();
        // Pages other than the bound one still show their strokes.
        for set in &cleared {
            if let Some(mut surface) = self.locator.locate(set.page) {
                surface.clear();
            }
        }
        self.deselect();
        log::info!(
            "Cleared {} marks on {} pages",
            cleared.iter().map(PageMarkSet::len).sum::<usize>(),
            cleared.len()
        );
    }

    fn export(&mut self, scope: ExportScope) {
        let data = match scope {
            ExportScope::All => self.store.pages().to_vec(),
            ExportScope::Current => vec![
                self.store
                    .page(self.page)
                    .cloned()
                    .unwrap_or_else(|| PageMarkSet::new(self.page)),
            ],
        };
        let payload = ExportPayload::new(scope, data);
        match self.sink.deliver(&payload) {
            Ok(()) => {
                log::info!("Exported {} page(s), scope {:?}", payload.data.len(), scope);
                self.emit(EngineEvent::Exported { scope });
            }
            Err(e) => log::warn!("Export not delivered: {}", e),
        }
    }
}

fn paint<S: Surface>(surface: &mut S, mark: &PixelMark, width: f64) {
    match mark.kind {
        ShapeKind::HorizontalLine | ShapeKind::VerticalLine => {
            surface.stroke_line(mark.as_line(), width)
        }
        ShapeKind::Rectangle => surface.stroke_rect(mark.as_rect(), width),
        ShapeKind::None => {}
    }
}
