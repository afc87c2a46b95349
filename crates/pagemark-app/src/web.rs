//! WebAssembly entry point and DOM bindings.
//!
//! Each rendered page gets a transparent overlay canvas with id
//! `markpage{n}`. The engine binds to the current page's overlay, and
//! exports are posted to the embedding frame.

use kurbo::{Line, Rect, Size, Vec2};
use pagemark_core::{
    EngineConfig, EngineEvent, ExportError, ExportPayload, ExportSink, MarkBar, MarkCommand,
    MarkEngine, MarkStore, PageNumber, PointerEvent, ShapeKind, Surface, SurfaceLocator,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, MouseEvent};

const CANVAS_ID_PREFIX: &str = "markpage";
const OVERLAY_STYLE: &str = "position: absolute; top: 0; left: 0; z-index: 0";

/// DOM id of a page's overlay canvas.
pub fn canvas_id(page: PageNumber) -> String {
    format!("{}{}", CANVAS_ID_PREFIX, page)
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("No document"))
}

/// A page overlay canvas.
#[derive(Clone)]
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Wrap a canvas; `None` if it has no 2d context.
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let context = canvas
            .get_context("2d")
            .ok()??
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, context })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Size {
        Size::new(self.canvas.width() as f64, self.canvas.height() as f64)
    }

    fn viewport_offset(&self) -> Vec2 {
        let rect = self.canvas.get_bounding_client_rect();
        Vec2::new(rect.left(), rect.top())
    }

    fn clear(&mut self) {
        let size = self.size();
        self.context.clear_rect(0.0, 0.0, size.width, size.height);
    }

    fn stroke_line(&mut self, line: Line, width: f64) {
        self.context.set_line_width(width);
        self.context.begin_path();
        self.context.move_to(line.p0.x, line.p0.y);
        self.context.line_to(line.p1.x, line.p1.y);
        self.context.stroke();
    }

    fn stroke_rect(&mut self, rect: Rect, width: f64) {
        self.context.set_line_width(width);
        self.context
            .stroke_rect(rect.x0, rect.y0, rect.width(), rect.height());
    }

    fn set_raised(&mut self, raised: bool) {
        let z_index = if raised { "9999" } else { "0" };
        if let Err(e) = self.canvas.style().set_property("z-index", z_index) {
            log::warn!("Failed to set overlay z-index: {:?}", e);
        }
    }
}

/// Finds overlay canvases by their DOM id.
pub struct DomSurfaceLocator {
    document: Document,
}

impl SurfaceLocator for DomSurfaceLocator {
    type Surface = CanvasSurface;

    fn locate(&self, page: PageNumber) -> Option<CanvasSurface> {
        let canvas = self
            .document
            .get_element_by_id(&canvas_id(page))?
            .dyn_into::<HtmlCanvasElement>()
            .ok()?;
        CanvasSurface::new(canvas)
    }
}

/// Posts export payloads to the embedding frame, targeted at the referrer's origin.
pub struct ParentFrameSink;

impl ExportSink for ParentFrameSink {
    fn deliver(&mut self, payload: &ExportPayload) -> Result<(), ExportError> {
        let window = web_sys::window()
            .ok_or_else(|| ExportError::HostUnavailable("no window".to_string()))?;
        let parent = window
            .parent()
            .ok()
            .flatten()
            .ok_or_else(|| ExportError::HostUnavailable("no parent frame".to_string()))?;
        let referrer = window
            .document()
            .map(|document| document.referrer())
            .filter(|referrer| !referrer.is_empty())
            .ok_or_else(|| ExportError::HostUnavailable("no referrer".to_string()))?;

        let message = js_sys::JSON::parse(&payload.to_json()?)
            .map_err(|e| ExportError::Delivery(format!("{:?}", e)))?;
        parent
            .post_message(&message, &referrer)
            .map_err(|e| ExportError::Delivery(format!("{:?}", e)))
    }
}

type WebEngine = MarkEngine<DomSurfaceLocator>;
type MouseHandler = Closure<dyn FnMut(MouseEvent)>;

/// Mouse handlers installed on the bound overlay.
struct Wiring {
    canvas: HtmlCanvasElement,
    _on_down: MouseHandler,
    _on_move: MouseHandler,
    _on_up: MouseHandler,
}

impl Wiring {
    fn release(self) {
        self.canvas.set_onmousedown(None);
        self.canvas.set_onmousemove(None);
        self.canvas.set_onmouseup(None);
    }
}

struct Shared {
    engine: RefCell<WebEngine>,
    toolbar: RefCell<MarkBar>,
    wiring: RefCell<Option<Wiring>>,
    listener: RefCell<Option<js_sys::Function>>,
}

impl Shared {
    /// Run an engine call, then follow the binding and forward notifications.
    fn with_engine<R>(self: &Rc<Self>, f: impl FnOnce(&mut WebEngine) -> R) -> R {
        let result = f(&mut *self.engine.borrow_mut());
        self.rewire();
        self.flush_events();
        result
    }

    fn command(self: &Rc<Self>, command: MarkCommand) {
        self.with_engine(|engine| engine.handle_command(command));
    }

    fn pointer(self: &Rc<Self>, event: PointerEvent) {
        self.with_engine(|engine| engine.handle_pointer(event));
    }

    /// Move the mouse handlers to whatever canvas the engine is bound to.
    fn rewire(self: &Rc<Self>) {
        let bound = self
            .engine
            .borrow()
            .bound_surface()
            .map(|surface| surface.canvas().clone());
        let mut wiring = self.wiring.borrow_mut();
        let current = wiring.as_ref().map(|w| &w.canvas);
        if current == bound.as_ref() {
            return;
        }
        if let Some(old) = wiring.take() {
            old.release();
        }
        if let Some(canvas) = bound {
            *wiring = Some(self.wire(canvas));
        }
    }

    fn wire(self: &Rc<Self>, canvas: HtmlCanvasElement) -> Wiring {
        let on_down = handler(Rc::downgrade(self), PointerEvent::down);
        let on_move = handler(Rc::downgrade(self), PointerEvent::moved);
        let on_up = handler(Rc::downgrade(self), PointerEvent::up);
        canvas.set_onmousedown(Some(on_down.as_ref().unchecked_ref()));
        canvas.set_onmousemove(Some(on_move.as_ref().unchecked_ref()));
        canvas.set_onmouseup(Some(on_up.as_ref().unchecked_ref()));
        Wiring {
            canvas,
            _on_down: on_down,
            _on_move: on_move,
            _on_up: on_up,
        }
    }

    fn flush_events(&self) {
        let events = self.engine.borrow_mut().take_events();
        if events.is_empty() {
            return;
        }
        for event in &events {
            self.toolbar.borrow_mut().handle_event(event);
        }
        let Some(listener) = self.listener.borrow().clone() else {
            return;
        };
        for event in events {
            notify(&listener, &event);
        }
    }
}

fn handler(shared: Weak<Shared>, make: fn(f64, f64) -> PointerEvent) -> MouseHandler {
    Closure::new(move |event: MouseEvent| {
        if let Some(shared) = shared.upgrade() {
            shared.pointer(make(event.client_x() as f64, event.client_y() as f64));
        }
    })
}

fn notify(listener: &js_sys::Function, event: &EngineEvent) {
    let value = match serde_json::to_string(event) {
        Ok(json) => js_sys::JSON::parse(&json),
        Err(e) => {
            log::warn!("Failed to serialize {:?}: {}", event, e);
            return;
        }
    };
    match value {
        Ok(value) => {
            if let Err(e) = listener.call1(&JsValue::NULL, &value) {
                log::warn!("Event listener threw: {:?}", e);
            }
        }
        Err(e) => log::warn!("Failed to convert {:?}: {:?}", event, e),
    }
}

/// Browser-facing controller: toolbar buttons, page changes and overlay canvases.
#[wasm_bindgen]
pub struct WebMarkController {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl WebMarkController {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebMarkController, JsValue> {
        Self::with_state(None, None)
    }

    /// Create a controller from optional config and stored marks JSON.
    #[wasm_bindgen(js_name = withState)]
    pub fn with_state(
        config_json: Option<String>,
        marks_json: Option<String>,
    ) -> Result<WebMarkController, JsValue> {
        let config = match config_json {
            Some(json) => {
                EngineConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?
            }
            None => EngineConfig::default(),
        };
        let store = match marks_json {
            Some(json) => {
                MarkStore::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?
            }
            None => MarkStore::new(),
        };
        let locator = DomSurfaceLocator {
            document: document()?,
        };
        let engine = MarkEngine::with_store(store, config, locator, ParentFrameSink)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        log::info!("Mark controller ready ({} stored marks)", engine.store().len());
        Ok(Self {
            shared: Rc::new(Shared {
                engine: RefCell::new(engine),
                toolbar: RefCell::new(MarkBar::new()),
                wiring: RefCell::new(None),
                listener: RefCell::new(None),
            }),
        })
    }

    /// Receive engine notifications as plain objects.
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&self, callback: js_sys::Function) {
        *self.shared.listener.borrow_mut() = Some(callback);
    }

    #[wasm_bindgen(js_name = setPage)]
    pub fn set_page(&self, page: PageNumber) {
        self.shared.with_engine(|engine| engine.set_page(page));
    }

    /// Create (or replace) a page's overlay canvas inside `parent`.
    #[wasm_bindgen(js_name = createMarkCanvas)]
    pub fn create_mark_canvas(
        &self,
        page: PageNumber,
        width: u32,
        height: u32,
        parent: &HtmlElement,
    ) -> Result<(), JsValue> {
        let document = document()?;
        let id = canvas_id(page);
        if let Some(old) = document.get_element_by_id(&id) {
            old.remove();
        }
        let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        canvas.set_id(&id);
        canvas.set_width(width);
        canvas.set_height(height);
        canvas.style().set_css_text(OVERLAY_STYLE);
        parent.append_child(&canvas)?;

        let Some(mut surface) = CanvasSurface::new(canvas) else {
            return Err(JsValue::from_str("Overlay canvas has no 2d context"));
        };
        self.shared.with_engine(|engine| {
            if page == engine.page() {
                engine.bind(page, surface);
            } else {
                engine.paint_page(page, &mut surface);
            }
        });
        Ok(())
    }

    #[wasm_bindgen(js_name = openToolbar)]
    pub fn open_toolbar(&self) {
        self.shared.toolbar.borrow_mut().open();
    }

    #[wasm_bindgen(js_name = closeToolbar)]
    pub fn close_toolbar(&self) {
        let commands = self.shared.toolbar.borrow_mut().close();
        for command in commands {
            self.shared.command(command);
        }
    }

    /// Press a shape button by its numeric kind code.
    pub fn select(&self, kind: i8) -> Result<(), JsValue> {
        let kind = ShapeKind::try_from(kind).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let command = self.shared.toolbar.borrow_mut().select(kind);
        self.shared.command(command);
        Ok(())
    }

    pub fn undo(&self) {
        self.shared.command(MarkCommand::Undo);
    }

    pub fn delete(&self) {
        let command = self.shared.toolbar.borrow().delete();
        if let Some(command) = command {
            self.shared.command(command);
        }
    }

    #[wasm_bindgen(js_name = clearPage)]
    pub fn clear_page(&self) {
        self.shared.command(MarkCommand::ClearPage);
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&self) {
        self.shared.command(MarkCommand::ClearAll);
    }

    #[wasm_bindgen(js_name = exportAll)]
    pub fn export_all(&self) {
        self.shared.command(MarkCommand::ExportAll);
    }

    #[wasm_bindgen(js_name = exportCurrent)]
    pub fn export_current(&self) {
        self.shared.command(MarkCommand::ExportCurrent);
    }

    #[wasm_bindgen(getter, js_name = shapeKind)]
    pub fn shape_kind(&self) -> i8 {
        self.shared.toolbar.borrow().shape_kind().code()
    }

    #[wasm_bindgen(getter, js_name = deleteEnabled)]
    pub fn delete_enabled(&self) -> bool {
        self.shared.toolbar.borrow().delete_enabled()
    }

    #[wasm_bindgen(getter, js_name = isToolbarOpen)]
    pub fn is_toolbar_open(&self) -> bool {
        self.shared.toolbar.borrow().is_open()
    }

    /// The document's marks as page-set JSON.
    #[wasm_bindgen(js_name = marksJson)]
    pub fn marks_json(&self) -> Result<String, JsValue> {
        self.shared
            .engine
            .borrow()
            .store()
            .to_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Drop for WebMarkController {
    fn drop(&mut self) {
        if let Some(wiring) = self.shared.wiring.borrow_mut().take() {
            wiring.release();
        }
    }
}

/// Initialize logging for the WASM module.
#[wasm_bindgen(start)]
pub fn run_wasm() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to initialize logger");
    log::info!("Starting Pagemark (WASM)");
}
