use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlCanvasElement;

use globe::{GlobeConfig, GlobeEngine};
use layers::Starfield;

mod dom;
pub mod mesh;
mod wgpu;

use dom::{DomHost, SharedEngine, dispatch_events, now};
use wgpu::WgpuSurface;

// `start` may run again when the module is re-instantiated during hot reload.
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Options accepted by [`mount_globe`]; every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MountOptions {
    pub config: GlobeConfig,
    pub selected_code: Option<String>,
}

impl MountOptions {
    pub fn from_json(text: Option<&str>) -> Result<Self, String> {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return Ok(Self::default());
        };
        let opts: MountOptions =
            serde_json::from_str(text).map_err(|e| format!("invalid mount options: {e}"))?;
        opts.config.validate().map_err(|e| e.to_string())?;
        Ok(opts)
    }
}

struct Mount {
    engine: SharedEngine,
    host: DomHost,
    // Bumped per mount so a surface finishing init after unmount is dropped.
    generation: u64,
}

thread_local! {
    static MOUNT: RefCell<Option<Mount>> = const { RefCell::new(None) };
    static GENERATION: RefCell<u64> = const { RefCell::new(0) };
}

#[wasm_bindgen(start)]
pub fn start() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

/// Mounts a globe on the canvas with id `canvas_id`, replacing any globe
/// already mounted. `on_select` receives the code of a tapped country, or
/// `null` for a tapped feature without a code.
#[wasm_bindgen]
pub fn mount_globe(
    canvas_id: &str,
    options_json: Option<String>,
    on_select: js_sys::Function,
) -> Result<(), JsValue> {
    let opts = MountOptions::from_json(options_json.as_deref()).map_err(|e| JsValue::from_str(&e))?;
    let canvas = dom::window()?
        .document()
        .ok_or_else(|| JsValue::from_str("document missing"))?
        .get_element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str(&format!("canvas #{canvas_id} missing")))?
        .dyn_into::<HtmlCanvasElement>()?;

    unmount_globe();

    let stars = {
        let s = &opts.config.stars;
        Starfield::generate(s.count, s.radius, s.seed, s.size, s.opacity)
    };
    let url = opts.config.geography_url.clone();
    let engine: SharedEngine = Rc::new(RefCell::new(GlobeEngine::new(opts.config, now())));
    if opts.selected_code.is_some() {
        engine
            .borrow_mut()
            .set_selected_code(opts.selected_code.as_deref());
    }

    let mut host = DomHost::new();
    host.attach_input(&canvas, &engine, &on_select)?;
    host.attach_resize(&canvas, &engine)?;
    let ticket = engine.borrow_mut().begin_load();
    host.start_load(url, ticket, &engine, &on_select)?;
    host.start_frames(&engine, &on_select)?;

    let generation = GENERATION.with(|g| {
        let mut g = g.borrow_mut();
        *g += 1;
        *g
    });
    MOUNT.with(|m| {
        *m.borrow_mut() = Some(Mount {
            engine: engine.clone(),
            host,
            generation,
        })
    });

    spawn_local(async move {
        match WgpuSurface::new(&canvas, &stars).await {
            Ok(surface) => {
                let current = MOUNT.with(|m| {
                    m.borrow()
                        .as_ref()
                        .is_some_and(|m| m.generation == generation)
                });
                if current {
                    engine.borrow_mut().attach_surface(Box::new(surface));
                } else {
                    tracing::debug!("surface ready after unmount, dropping");
                }
            }
            Err(e) => tracing::error!(error = ?e, "renderer init failed"),
        }
        dispatch_events(&engine, &on_select);
    });

    tracing::info!(canvas = canvas_id, "globe mounted");
    Ok(())
}

/// Tears the mounted globe down. Safe to call when nothing is mounted.
#[wasm_bindgen]
pub fn unmount_globe() {
    let Some(mut mount) = MOUNT.with(|m| m.borrow_mut().take()) else {
        return;
    };
    mount.engine.borrow_mut().teardown(&mut mount.host);
    // The caller may be one of the mount's own callbacks; free them later.
    spawn_local(async move {
        drop(mount);
    });
}

/// Selects the country with `code` (case-insensitive) and turns the globe
/// towards it; `None` clears the selection. Codes seen before the geography
/// has loaded are applied once it arrives.
#[wasm_bindgen]
pub fn set_selected_code(code: Option<String>) {
    MOUNT.with(|m| {
        if let Some(mount) = m.borrow().as_ref() {
            mount.engine.borrow_mut().set_selected_code(code.as_deref());
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_use_defaults() {
        let opts = MountOptions::from_json(None).unwrap();
        assert_eq!(opts.config, GlobeConfig::default());
        assert!(opts.selected_code.is_none());
        assert!(MountOptions::from_json(Some("  ")).unwrap().selected_code.is_none());
    }

    #[test]
    fn options_carry_config_and_initial_code() {
        let opts = MountOptions::from_json(Some(
            r#"{ "config": { "geography_url": "/world.json" }, "selected_code": "fr" }"#,
        ))
        .unwrap();
        assert_eq!(opts.config.geography_url, "/world.json");
        assert_eq!(opts.selected_code.as_deref(), Some("fr"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = MountOptions::from_json(Some(r#"{ "config": { "camera": { "fov_y_deg": 0 } } }"#))
            .unwrap_err();
        assert!(err.contains("fov_y_deg"));
    }
}
