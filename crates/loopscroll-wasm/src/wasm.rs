//! `wasm-bindgen` exports for the browser page.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use js_sys::{Array, Function, Object, Reflect};
use loopscroll_core::{
    ElementRect, FrameHandle, ScrollSession, Scheduler, TimerHandle, Viewport,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Document, ScrollBehavior, ScrollToOptions, Window};
use web_time::Duration;

use crate::bridge::{ChangeSlot, config_from_json, lit_dot, snapshot_fields};

type SessionCell = RefCell<Option<ScrollSession<DomHost>>>;

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn install_panic_hook() {
    use std::sync::Once;
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let global = js_sys::global();
            if let Ok(console) = Reflect::get(&global, &"console".into()) {
                if let Ok(error) = Reflect::get(&console, &"error".into()) {
                    if let Ok(f) = error.dyn_into::<Function>() {
                        let _ = f.call1(&console, &JsValue::from_str(&format!("{info}")));
                    }
                }
            }
        }));
    });
}

/// Run `f` on the session, then deliver a pending change notification once
/// the session is no longer borrowed.
fn with_session<R>(
    cell: &SessionCell,
    changes: &ChangeSlot,
    on_change: &RefCell<Option<Function>>,
    f: impl FnOnce(&mut ScrollSession<DomHost>) -> R,
) -> Option<R> {
    let result = {
        let Ok(mut guard) = cell.try_borrow_mut() else {
            tracing::warn!(target: "loopscroll.session", "re-entrant call ignored");
            return None;
        };
        guard.as_mut().map(f)
    };
    if let Some(snapshot) = changes.take() {
        let revision = cell
            .try_borrow()
            .ok()
            .and_then(|s| s.as_ref().map(ScrollSession::revision))
            .unwrap_or(0);
        let callback = on_change.borrow().clone();
        if let Some(callback) = callback {
            let obj = Object::new();
            for (key, value) in snapshot_fields(&snapshot, revision) {
                set_js(&obj, key, JsValue::from_f64(value));
            }
            let _ = callback.call1(&JsValue::NULL, &obj);
        }
    }
    result
}

// ============================================================================
// DOM host
// ============================================================================

/// [`Viewport`] and [`Scheduler`] over `window` and `document`.
struct DomHost {
    window: Window,
    document: Document,
    next_handle: u64,
    frame: Option<(FrameHandle, i32)>,
    timers: HashMap<TimerHandle, i32>,
    frame_callback: Option<Closure<dyn FnMut(f64)>>,
    timer_callback: Option<Closure<dyn FnMut(JsValue)>>,
}

impl DomHost {
    fn new(window: Window, document: Document) -> Self {
        Self {
            window,
            document,
            next_handle: 0,
            frame: None,
            timers: HashMap::new(),
            frame_callback: None,
            timer_callback: None,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Create the persistent frame and timer callbacks once the session cell exists.
    fn install_callbacks(
        &mut self,
        cell: Weak<SessionCell>,
        changes: ChangeSlot,
        on_change: Weak<RefCell<Option<Function>>>,
    ) {
        let (frame_cell, frame_changes, frame_listener) =
            (cell.clone(), changes.clone(), on_change.clone());
        self.frame_callback = Some(Closure::wrap(Box::new(move |_timestamp: f64| {
            let (Some(cell), Some(on_change)) = (frame_cell.upgrade(), frame_listener.upgrade())
            else {
                return;
            };
            with_session(&cell, &frame_changes, &on_change, |session| {
                if let Some((handle, _)) = session.host_mut().frame.take() {
                    session.on_frame(handle);
                }
            });
        }) as Box<dyn FnMut(f64)>));

        self.timer_callback = Some(Closure::wrap(Box::new(move |id: JsValue| {
            let (Some(cell), Some(on_change)) = (cell.upgrade(), on_change.upgrade()) else {
                return;
            };
            let Some(id) = id.as_f64() else {
                return;
            };
            let handle = TimerHandle(id as u64);
            with_session(&cell, &changes, &on_change, |session| {
                session.host_mut().timers.remove(&handle);
                session.on_timeout(handle);
            });
        }) as Box<dyn FnMut(JsValue)>));
    }

    fn scroll_with(&self, offset: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(offset);
        options.set_behavior(behavior);
        self.window.scroll_to_with_scroll_to_options(&options);
    }
}

impl Viewport for DomHost {
    fn scroll_offset(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|h| h.as_f64())
            .unwrap_or(0.0)
    }

    fn measure(&self, id: &str) -> Option<ElementRect> {
        let rect = self.document.get_element_by_id(id)?.get_bounding_client_rect();
        Some(ElementRect::new(rect.top(), rect.height()))
    }

    fn jump_to(&mut self, offset: f64) {
        self.scroll_with(offset, ScrollBehavior::Instant);
    }

    fn smooth_scroll_to(&mut self, offset: f64) {
        self.scroll_with(offset, ScrollBehavior::Smooth);
    }
}

impl Scheduler for DomHost {
    fn request_frame(&mut self) -> FrameHandle {
        if let Some((_, id)) = self.frame.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        let handle = FrameHandle(self.next_id());
        let Some(callback) = self.frame_callback.as_ref() else {
            return handle;
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(id) => self.frame = Some((handle, id)),
            Err(err) => {
                tracing::warn!(target: "loopscroll.session", ?err, "requestAnimationFrame failed");
            }
        }
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some((pending, id)) = self.frame {
            if pending == handle {
                self.frame = None;
                let _ = self.window.cancel_animation_frame(id);
            }
        }
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id());
        let Some(callback) = self.timer_callback.as_ref() else {
            return handle;
        };
        let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let args = Array::of1(&JsValue::from_f64(handle.0 as f64));
        match self.window.set_timeout_with_callback_and_timeout_and_arguments(
            callback.as_ref().unchecked_ref(),
            ms,
            &args,
        ) {
            Ok(id) => {
                self.timers.insert(handle, id);
            }
            Err(err) => {
                tracing::warn!(target: "loopscroll.session", ?err, "setTimeout failed");
            }
        }
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        if let Some(id) = self.timers.remove(&handle) {
            self.window.clear_timeout_with_handle(id);
        }
    }
}

// ============================================================================
// Exports
// ============================================================================

struct WindowListeners {
    window: Window,
    scroll: Closure<dyn FnMut()>,
    resize: Closure<dyn FnMut()>,
}

impl WindowListeners {
    fn remove(&self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("scroll", self.scroll.as_ref().unchecked_ref());
        let _ = self
            .window
            .remove_event_listener_with_callback("resize", self.resize.as_ref().unchecked_ref());
    }
}

/// Looping scroll controller bound to the current page.
#[wasm_bindgen]
pub struct LoopScroll {
    session: Rc<SessionCell>,
    changes: ChangeSlot,
    on_change: Rc<RefCell<Option<Function>>>,
    listeners: Option<WindowListeners>,
}

#[wasm_bindgen]
impl LoopScroll {
    /// Create a controller. `config` is an optional JSON `LoopConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<LoopScroll, JsValue> {
        install_panic_hook();
        let config = config_from_json(config.as_deref())
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let session = ScrollSession::new(DomHost::new(window, document), config)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let cell: Rc<SessionCell> = Rc::new(RefCell::new(Some(session)));
        let changes = ChangeSlot::default();
        let on_change: Rc<RefCell<Option<Function>>> = Rc::default();

        if let Some(session) = cell.borrow_mut().as_mut() {
            session.set_listener(changes.listener());
            session.host_mut().install_callbacks(
                Rc::downgrade(&cell),
                changes.clone(),
                Rc::downgrade(&on_change),
            );
        }

        Ok(Self {
            session: cell,
            changes,
            on_change,
            listeners: None,
        })
    }

    /// Attach window listeners and take the first measurement. Call once
    /// the sections and buffers are in the DOM.
    pub fn mount(&mut self) -> Result<(), JsValue> {
        if self.listeners.is_some() {
            return Ok(());
        }
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let scroll = self.listener(|session| session.on_scroll());
        let resize = self.listener(|session| session.on_resize());

        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        window.add_event_listener_with_callback_and_add_event_listener_options(
            "scroll",
            scroll.as_ref().unchecked_ref(),
            &options,
        )?;
        window.add_event_listener_with_callback_and_add_event_listener_options(
            "resize",
            resize.as_ref().unchecked_ref(),
            &options,
        )?;
        self.listeners = Some(WindowListeners {
            window,
            scroll,
            resize,
        });

        self.run(|session| session.mount());
        Ok(())
    }

    /// Smooth-scroll to a section. Throws for unknown or unrendered ids.
    #[wasm_bindgen(js_name = navigateToSection)]
    pub fn navigate_to_section(&self, id: &str) -> Result<(), JsValue> {
        match self.run(|session| session.navigate_to_section(id)) {
            Some(Ok(())) => Ok(()),
            Some(Err(err)) => Err(JsValue::from_str(&err.to_string())),
            None => Err(JsValue::from_str("session busy")),
        }
    }

    /// Jump home and forget loop traversals.
    pub fn reset(&self) {
        self.run(|session| session.reset());
    }

    /// Register the change callback. It receives a snapshot object.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: Option<Function>) {
        *self.on_change.borrow_mut() = callback;
    }

    /// `{ activeSectionIndex, progressIndicator, loopCount, revision }`.
    pub fn snapshot(&self) -> JsValue {
        let obj = Object::new();
        if let Ok(guard) = self.session.try_borrow() {
            if let Some(session) = guard.as_ref() {
                for (key, value) in snapshot_fields(&session.snapshot(), session.revision()) {
                    set_js(&obj, key, JsValue::from_f64(value));
                }
            }
        }
        obj.into()
    }

    /// Navigation rail: `[{ id, label, active, dot }]`, `dot` is -1 when none is lit.
    pub fn navigation(&self) -> JsValue {
        let items = Array::new();
        if let Ok(guard) = self.session.try_borrow() {
            if let Some(session) = guard.as_ref() {
                for item in session.navigation().items {
                    let obj = Object::new();
                    set_js(&obj, "id", JsValue::from_str(&item.id));
                    set_js(&obj, "label", JsValue::from_str(&item.label));
                    set_js(&obj, "active", JsValue::from_bool(item.active));
                    set_js(&obj, "dot", JsValue::from(lit_dot(&item)));
                    items.push(&obj);
                }
            }
        }
        items.into()
    }

    /// Detach listeners and cancel pending frames and timers.
    pub fn destroy(&mut self) {
        if let Some(listeners) = self.listeners.take() {
            listeners.remove();
        }
        self.run(|session| session.teardown());
        *self.on_change.borrow_mut() = None;
    }
}

impl LoopScroll {
    fn listener(&self, f: fn(&mut ScrollSession<DomHost>)) -> Closure<dyn FnMut()> {
        let cell = Rc::downgrade(&self.session);
        let changes = self.changes.clone();
        let on_change = Rc::downgrade(&self.on_change);
        Closure::wrap(Box::new(move || {
            if let (Some(cell), Some(on_change)) = (cell.upgrade(), on_change.upgrade()) {
                with_session(&cell, &changes, &on_change, f);
            }
        }) as Box<dyn FnMut()>)
    }

    fn run<R>(&self, f: impl FnOnce(&mut ScrollSession<DomHost>) -> R) -> Option<R> {
        with_session(&self.session, &self.changes, &self.on_change, f)
    }
}

impl Drop for LoopScroll {
    fn drop(&mut self) {
        self.destroy();
    }
}
