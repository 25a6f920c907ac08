use std::cell::{Cell, RefCell};
use std::rc::Rc;

use foundation::time::Time;
use globe::{EngineEvent, EngineHost, GlobeEngine, LoadError, LoadTicket};
use gloo_net::http::Request;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    AbortController, AddEventListenerOptions, Event, EventTarget, HtmlCanvasElement, PointerEvent,
    ResizeObserver, WheelEvent, Window,
};

pub type SharedEngine = Rc<RefCell<GlobeEngine>>;

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))
}

pub fn now() -> Time {
    let ms = web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0);
    Time(ms)
}

/// One registered DOM listener, removed again by [`Listener::detach`].
struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        passive: Option<bool>,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        match passive {
            Some(passive) => {
                let opts = AddEventListenerOptions::new();
                opts.set_passive(passive);
                target.add_event_listener_with_callback_and_add_event_listener_options(
                    kind,
                    callback.as_ref().unchecked_ref(),
                    &opts,
                )?;
            }
            None => {
                target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
            }
        }
        Ok(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }

    fn detach(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

type FrameCallback = Closure<dyn FnMut(f64)>;

/// DOM-side resources of one mounted globe.
#[derive(Default)]
pub struct DomHost {
    listeners: Vec<Listener>,
    observer: Option<(ResizeObserver, Closure<dyn FnMut(js_sys::Array, ResizeObserver)>)>,
    abort: Option<AbortController>,
    frame_slot: Rc<RefCell<Option<FrameCallback>>>,
    frame_handle: Rc<Cell<Option<i32>>>,
    // Held until the host drops; `stop_frames` can run inside this callback.
    retired_frame: Option<FrameCallback>,
}

impl DomHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer, wheel and leave handlers on the canvas. Pointer coordinates
    /// are CSS pixels relative to the canvas' bounding box.
    pub fn attach_input(
        &mut self,
        canvas: &HtmlCanvasElement,
        engine: &SharedEngine,
        on_select: &js_sys::Function,
    ) -> Result<(), JsValue> {
        let _ = canvas.style().set_property("touch-action", "none");
        let target: &EventTarget = canvas.as_ref();

        let local = |ev: &PointerEvent, canvas: &HtmlCanvasElement| {
            let rect = canvas.get_bounding_client_rect();
            (
                ev.client_x() as f64 - rect.left(),
                ev.client_y() as f64 - rect.top(),
            )
        };

        {
            let (engine, canvas_el, on_select) = (engine.clone(), canvas.clone(), on_select.clone());
            self.listeners.push(Listener::attach(target, "pointerdown", None, move |ev| {
                let Some(ev) = ev.dyn_ref::<PointerEvent>() else {
                    return;
                };
                let _ = canvas_el.set_pointer_capture(ev.pointer_id());
                let (x, y) = local(ev, &canvas_el);
                engine
                    .borrow_mut()
                    .pointer_down(ev.pointer_id(), x, y, Time(ev.time_stamp()));
                dispatch_events(&engine, &on_select);
            })?);
        }
        {
            let (engine, canvas_el) = (engine.clone(), canvas.clone());
            self.listeners.push(Listener::attach(target, "pointermove", None, move |ev| {
                let Some(ev) = ev.dyn_ref::<PointerEvent>() else {
                    return;
                };
                let (x, y) = local(ev, &canvas_el);
                engine
                    .borrow_mut()
                    .pointer_move(ev.pointer_id(), x, y, Time(ev.time_stamp()));
            })?);
        }
        {
            let (engine, canvas_el, on_select) = (engine.clone(), canvas.clone(), on_select.clone());
            self.listeners.push(Listener::attach(target, "pointerup", None, move |ev| {
                let Some(ev) = ev.dyn_ref::<PointerEvent>() else {
                    return;
                };
                let (x, y) = local(ev, &canvas_el);
                engine
                    .borrow_mut()
                    .pointer_up(ev.pointer_id(), x, y, Time(ev.time_stamp()));
                dispatch_events(&engine, &on_select);
            })?);
        }
        {
            let engine = engine.clone();
            self.listeners.push(Listener::attach(target, "pointercancel", None, move |ev| {
                let Some(ev) = ev.dyn_ref::<PointerEvent>() else {
                    return;
                };
                engine
                    .borrow_mut()
                    .pointer_cancel(ev.pointer_id(), Time(ev.time_stamp()));
            })?);
        }
        {
            let engine = engine.clone();
            self.listeners.push(Listener::attach(target, "pointerleave", None, move |_| {
                engine.borrow_mut().pointer_leave();
            })?);
        }
        {
            let engine = engine.clone();
            self.listeners.push(Listener::attach(target, "wheel", Some(false), move |ev| {
                let Some(ev) = ev.dyn_ref::<WheelEvent>() else {
                    return;
                };
                ev.prevent_default();
                engine.borrow_mut().wheel(ev.delta_y(), Time(ev.time_stamp()));
            })?);
        }
        Ok(())
    }

    /// Watches the canvas' container for size changes, or the window when
    /// `ResizeObserver` is unavailable. Also queues the initial size.
    pub fn attach_resize(
        &mut self,
        canvas: &HtmlCanvasElement,
        engine: &SharedEngine,
    ) -> Result<(), JsValue> {
        let window = window()?;
        let container: web_sys::Element = canvas
            .parent_element()
            .unwrap_or_else(|| canvas.clone().unchecked_into());

        let measure = {
            let (engine, container, window) = (engine.clone(), container.clone(), window.clone());
            move || {
                let w = container.client_width() as f64;
                let h = container.client_height() as f64;
                engine
                    .borrow_mut()
                    .request_resize(w, h, window.device_pixel_ratio(), now());
            }
        };
        measure();

        let has_observer =
            js_sys::Reflect::has(&window, &JsValue::from_str("ResizeObserver")).unwrap_or(false);
        if has_observer {
            let measure = measure.clone();
            let callback = Closure::<dyn FnMut(js_sys::Array, ResizeObserver)>::new(
                move |_entries: js_sys::Array, _observer: ResizeObserver| measure(),
            );
            let observer = ResizeObserver::new(callback.as_ref().unchecked_ref())?;
            observer.observe(&container);
            self.observer = Some((observer, callback));
        } else {
            tracing::debug!("ResizeObserver unavailable, falling back to window resize");
            let target: &EventTarget = window.as_ref();
            self.listeners
                .push(Listener::attach(target, "resize", None, move |_| measure())?);
        }
        Ok(())
    }

    /// Starts the `requestAnimationFrame` loop driving [`GlobeEngine::tick`].
    pub fn start_frames(
        &mut self,
        engine: &SharedEngine,
        on_select: &js_sys::Function,
    ) -> Result<(), JsValue> {
        let window = window()?;
        let slot = self.frame_slot.clone();
        let handle = self.frame_handle.clone();
        let (engine, on_select) = (engine.clone(), on_select.clone());
        let win = window.clone();

        let callback = Closure::<dyn FnMut(f64)>::new(move |ts: f64| {
            engine.borrow_mut().tick(Time(ts));
            dispatch_events(&engine, &on_select);

            if let Some(cb) = slot.borrow().as_ref() {
                match win.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    Ok(id) => handle.set(Some(id)),
                    Err(e) => tracing::error!(error = ?e, "requestAnimationFrame failed"),
                }
            }
        });
        let id = window.request_animation_frame(callback.as_ref().unchecked_ref())?;
        self.frame_handle.set(Some(id));
        *self.frame_slot.borrow_mut() = Some(callback);
        Ok(())
    }

    /// Issues the geography request. The result reaches the engine only if
    /// `ticket` is still current when the response arrives.
    pub fn start_load(
        &mut self,
        url: String,
        ticket: LoadTicket,
        engine: &SharedEngine,
        on_select: &js_sys::Function,
    ) -> Result<(), JsValue> {
        let controller = AbortController::new()?;
        let signal = controller.signal();
        self.abort = Some(controller);

        let (engine, on_select) = (engine.clone(), on_select.clone());
        spawn_local(async move {
            let body = fetch_text(&url, &signal).await;
            engine.borrow_mut().finish_load(ticket, body);
            dispatch_events(&engine, &on_select);
        });
        Ok(())
    }
}

impl EngineHost for DomHost {
    fn abort_load(&mut self) {
        if let Some(controller) = self.abort.take() {
            controller.abort();
        }
    }

    fn detach_input(&mut self) {
        for l in &self.listeners {
            l.detach();
        }
        if let Some((observer, _)) = &self.observer {
            observer.disconnect();
        }
    }

    fn stop_frames(&mut self) {
        if let (Some(id), Ok(window)) = (self.frame_handle.take(), window()) {
            let _ = window.cancel_animation_frame(id);
        }
        self.retired_frame = self.frame_slot.borrow_mut().take();
    }
}

async fn fetch_text(url: &str, signal: &web_sys::AbortSignal) -> Result<String, LoadError> {
    let resp = Request::get(url)
        .abort_signal(Some(signal))
        .send()
        .await
        .map_err(map_fetch_error)?;
    if !resp.ok() {
        return Err(LoadError::Fetch(format!(
            "{url}: HTTP {} {}",
            resp.status(),
            resp.status_text()
        )));
    }
    resp.text().await.map_err(map_fetch_error)
}

fn map_fetch_error(e: gloo_net::Error) -> LoadError {
    match e {
        gloo_net::Error::JsError(js) if js.name == "AbortError" => LoadError::Aborted,
        other => LoadError::Fetch(other.to_string()),
    }
}

/// Forwards selection events to the host callback. The engine borrow is
/// released before calling out, so the callback may call back in.
pub fn dispatch_events(engine: &SharedEngine, on_select: &js_sys::Function) {
    let events = engine.borrow_mut().drain_events();
    for event in events {
        if let EngineEvent::SelectionChanged { code } = event.payload {
            let arg = code.map(|c| JsValue::from_str(&c)).unwrap_or(JsValue::NULL);
            if let Err(e) = on_select.call1(&JsValue::NULL, &arg) {
                tracing::warn!(error = ?e, "selection callback threw");
            }
        }
    }
}
