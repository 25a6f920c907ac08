use formats::{GeographyDocument, build_feature_index};
use foundation::math::{Quat, SphericalProjector, Vec3};
use foundation::time::Time;
use layers::{
    BORDER_LAYER, LayerStyle, LineLayer, MapTexture, SELECTION_OUTLINE_LAYER, build_border_layer,
    build_outline_layer,
};
use runtime::{Debouncer, Event, EventBus, Frame, FrameClock};
use scene::{FeatureId, FeatureIndex, PickHit, SelectionState, normalize_code, pick_ray};

use crate::camera::CameraRig;
use crate::config::GlobeConfig;
use crate::focus::{FocusAnimator, feature_direction};
use crate::gesture::{GestureController, GestureEffect, PointerId};
use crate::idle::{IdleAutorotator, IdleDecision, IdleGuard, IdleInputs};
use crate::loader::{GeographyLoader, LoadError, LoadTicket};
use crate::surface::{EngineHost, FrameView, Lighting, RenderSurface};

/// Upper bound on the device pixel ratio used for the drawable.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A tap picked a feature. `code` is its normalized code, if it has one.
    SelectionChanged { code: Option<String> },
    GeographyLoaded { features: usize, codes: usize },
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Viewport {
    css_width: f64,
    css_height: f64,
    pixel_ratio: f64,
}

impl Viewport {
    fn physical(&self) -> (u32, u32) {
        let w = (self.css_width * self.pixel_ratio).round().max(1.0) as u32;
        let h = (self.css_height * self.pixel_ratio).round().max(1.0) as u32;
        (w, h)
    }
}

/// One mounted globe: feature data, selection, camera, gestures, animation
/// and the per-frame loop that commits them.
///
/// Input handlers only stage changes; [`GlobeEngine::tick`] is the single
/// place orientation and camera distance are committed and a frame drawn.
pub struct GlobeEngine {
    config: GlobeConfig,
    projector: SphericalProjector,
    index: FeatureIndex,
    selection: SelectionState,
    external_code: Option<String>,

    orientation: Quat,
    staged_world: Quat,
    staged_local: Quat,
    camera: CameraRig,
    gestures: GestureController,
    focus: FocusAnimator,
    pending_focus: Option<FeatureId>,
    idle: IdleAutorotator,
    last_idle: IdleDecision,

    texture: MapTexture,
    borders: LineLayer,
    outline: LineLayer,
    borders_dirty: bool,
    outline_dirty: bool,
    full_upload: bool,

    loader: GeographyLoader,
    resize: Debouncer<Viewport>,
    viewport: Option<Viewport>,
    clock: FrameClock,
    events: EventBus<EngineEvent>,
    surface: Option<Box<dyn RenderSurface>>,
    torn_down: bool,
}

impl GlobeEngine {
    pub fn new(config: GlobeConfig, now: Time) -> Self {
        let projector = SphericalProjector::new(config.geometry.densify_step_deg);
        let radius = config.geometry.globe_radius;
        let camera = CameraRig::new(&config.camera, &config.navigation, radius);
        let gestures = GestureController::new(config.navigation);
        let focus = FocusAnimator::new(config.focus.duration_ms);
        let idle = IdleAutorotator::new(&config.auto_rotate, now);
        let resize = Debouncer::new(config.resize_debounce_ms);

        let mut texture = MapTexture::new(config.texture.width, config.texture.height);
        let index = FeatureIndex::empty();
        let selection = SelectionState::new();
        texture.redraw(&index, &selection, &config.palette);

        let borders = LineLayer::new(BORDER_LAYER, border_style(&config));
        let outline = LineLayer::new(SELECTION_OUTLINE_LAYER, outline_style(&config));

        Self {
            config,
            projector,
            index,
            selection,
            external_code: None,
            orientation: Quat::IDENTITY,
            staged_world: Quat::IDENTITY,
            staged_local: Quat::IDENTITY,
            camera,
            gestures,
            focus,
            pending_focus: None,
            idle,
            last_idle: IdleDecision::Suppressed(IdleGuard::CoolingDown),
            texture,
            borders,
            outline,
            borders_dirty: false,
            outline_dirty: false,
            full_upload: true,
            loader: GeographyLoader::new(),
            resize,
            viewport: None,
            clock: FrameClock::default(),
            events: EventBus::new(),
            surface: None,
            torn_down: false,
        }
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn index(&self) -> &FeatureIndex {
        &self.index
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn selected_code(&self) -> Option<&str> {
        let id = self.selection.selected()?;
        self.index.get(id)?.code.as_deref()
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn gestures(&self) -> &GestureController {
        &self.gestures
    }

    pub fn is_focusing(&self) -> bool {
        self.focus.is_active() || self.pending_focus.is_some()
    }

    /// Autorotation outcome of the most recent frame.
    pub fn last_idle_decision(&self) -> IdleDecision {
        self.last_idle
    }

    pub fn texture(&self) -> &MapTexture {
        &self.texture
    }

    pub fn borders(&self) -> &LineLayer {
        &self.borders
    }

    pub fn outline(&self) -> &LineLayer {
        &self.outline
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn attach_surface(&mut self, mut surface: Box<dyn RenderSurface>) {
        if self.torn_down {
            surface.release();
            return;
        }
        if let Some(vp) = self.viewport {
            let (w, h) = vp.physical();
            surface.resize(w, h);
        }
        if let Some(mut old) = self.surface.replace(surface) {
            old.release();
        }
        self.full_upload = true;
    }

    // ---- geography ----------------------------------------------------------

    pub fn begin_load(&mut self) -> LoadTicket {
        tracing::info!(url = %self.config.geography_url, "loading geography");
        self.loader.begin()
    }

    /// Delivers a fetched body. Returns `true` if a document was installed.
    /// Failures leave the globe bare; aborts are silent.
    pub fn finish_load(&mut self, ticket: LoadTicket, body: Result<String, LoadError>) -> bool {
        if self.torn_down {
            return false;
        }
        match self.loader.accept(ticket, body) {
            None => false,
            Some(Ok(doc)) => {
                self.install_document(&doc);
                true
            }
            Some(Err(e)) if e.is_aborted() => false,
            Some(Err(e)) => {
                tracing::error!(error = %e, "geography load failed; globe stays bare");
                false
            }
        }
    }

    pub fn install_document(&mut self, doc: &GeographyDocument) {
        let index = build_feature_index(doc);
        tracing::info!(
            features = index.len(),
            codes = index.code_count(),
            vertices = index.vertex_count(),
            "geography loaded"
        );
        self.install_index(index);
    }

    /// Replaces the feature set. Selection and hover reset; a remembered
    /// external code is applied against the new index.
    pub fn install_index(&mut self, index: FeatureIndex) {
        self.index = index;
        self.selection.clear();
        self.focus.cancel();
        self.pending_focus = None;

        let radius = self.config.geometry.globe_radius * self.config.geometry.border_radius_scale;
        self.borders = build_border_layer(
            &self.index,
            radius,
            border_style(&self.config),
            &self.projector,
        );
        self.borders_dirty = true;

        self.events.emit(
            self.clock.frames_started(),
            EngineEvent::GeographyLoaded {
                features: self.index.len(),
                codes: self.index.code_count(),
            },
        );

        let pending = self
            .external_code
            .as_deref()
            .and_then(|c| self.index.find_by_code(c))
            .map(|f| f.id);
        if let Some(id) = pending {
            self.pending_focus = Some(id);
        }
        self.select(pending);
        self.redraw();
    }

    // ---- external selection -------------------------------------------------

    /// Externally driven selection. Emits nothing. Before the geography
    /// arrives the code is remembered and applied on load.
    pub fn set_selected_code(&mut self, code: Option<&str>) {
        if self.torn_down {
            return;
        }
        self.external_code = code.and_then(normalize_code);

        let found = self
            .external_code
            .as_deref()
            .and_then(|c| self.index.find_by_code(c))
            .map(|f| f.id);

        if found.is_none() && self.external_code.is_some() && !self.index.is_empty() {
            tracing::debug!(code = ?self.external_code, "selected code not in index");
        }

        self.pending_focus = found;
        if self.select(found) {
            self.redraw();
        }
    }

    // ---- input --------------------------------------------------------------

    pub fn pointer_down(&mut self, id: PointerId, x: f64, y: f64, now: Time) {
        if self.torn_down {
            return;
        }
        self.note_input(now);
        let effect = self.gestures.pointer_down(id, x, y, now);
        self.apply_effect(effect);
    }

    /// Moves of tracked contacts drive the gesture; moves with nothing
    /// pressed update hover instead.
    pub fn pointer_move(&mut self, id: PointerId, x: f64, y: f64, now: Time) {
        if self.torn_down {
            return;
        }
        if !self.gestures.tracks(id) {
            if !self.gestures.is_pointer_down() {
                self.pointer_hover(x, y);
            }
            return;
        }
        self.note_input(now);
        let effect = self.gestures.pointer_move(id, x, y);
        self.apply_effect(effect);
    }

    pub fn pointer_up(&mut self, id: PointerId, x: f64, y: f64, now: Time) {
        if self.torn_down || !self.gestures.tracks(id) {
            return;
        }
        self.note_input(now);
        let effect = self.gestures.pointer_up(id, x, y, now);
        self.apply_effect(effect);
    }

    pub fn pointer_cancel(&mut self, id: PointerId, now: Time) {
        if self.torn_down || !self.gestures.tracks(id) {
            return;
        }
        self.note_input(now);
        let effect = self.gestures.pointer_cancel(id);
        self.apply_effect(effect);
    }

    pub fn wheel(&mut self, delta_y: f64, now: Time) {
        if self.torn_down {
            return;
        }
        self.note_input(now);
        let effect = self.gestures.wheel(delta_y);
        self.apply_effect(effect);
    }

    /// Hover pick; ignored while any contact is down.
    pub fn pointer_hover(&mut self, x: f64, y: f64) {
        if self.torn_down || self.gestures.is_pointer_down() {
            return;
        }
        let hovered = self.pick(x, y).and_then(|hit| hit.feature);
        if self.selection.hover(hovered) {
            self.redraw();
        }
    }

    pub fn pointer_leave(&mut self) {
        if self.torn_down {
            return;
        }
        if self.selection.hover(None) {
            self.redraw();
        }
    }

    /// Picks at a viewport position in CSS pixels.
    pub fn pick(&self, x: f64, y: f64) -> Option<PickHit> {
        let ray = self.camera.ray_through(x, y)?;
        pick_ray(
            &self.index,
            ray,
            self.orientation,
            self.config.geometry.globe_radius,
            &self.projector,
        )
    }

    /// Code of the feature under a viewport position.
    pub fn feature_code_at(&self, x: f64, y: f64) -> Option<&str> {
        let id = self.pick(x, y)?.feature?;
        self.index.get(id)?.code.as_deref()
    }

    fn note_input(&mut self, now: Time) {
        self.idle.mark_input(now);
        let dropped_pending = self.pending_focus.take().is_some();
        if self.focus.cancel() || dropped_pending {
            tracing::trace!("focus animation preempted by input");
        }
    }

    fn apply_effect(&mut self, effect: GestureEffect) {
        match effect {
            GestureEffect::None => {}
            GestureEffect::Rotate { yaw_rad, pitch_rad } => {
                self.staged_local = self.staged_local * Quat::from_axis_angle(Vec3::Y, yaw_rad);
                self.staged_world = Quat::from_axis_angle(Vec3::X, pitch_rad) * self.staged_world;
            }
            GestureEffect::Zoom { factor } => self.camera.zoom_by(factor),
            GestureEffect::Tap { x, y } => self.tap(x, y),
        }
    }

    /// Ocean taps change nothing; a hit selects locally and is reported.
    fn tap(&mut self, x: f64, y: f64) {
        // staged drag rotation is empty for a tap, so picking against the
        // committed orientation matches what is on screen
        let Some(id) = self.pick(x, y).and_then(|hit| hit.feature) else {
            return;
        };
        let code = self.index.get(id).and_then(|f| f.code.clone());
        tracing::debug!(feature = id.0, code = ?code, "tap selected feature");

        if self.select(Some(id)) {
            self.redraw();
        }
        self.pending_focus = Some(id);
        self.events.emit(
            self.clock.frames_started(),
            EngineEvent::SelectionChanged { code },
        );
    }

    /// Updates the selection and the outline. Returns `true` on change.
    fn select(&mut self, id: Option<FeatureId>) -> bool {
        if !self.selection.select(id) {
            return false;
        }
        let radius =
            self.config.geometry.globe_radius * self.config.geometry.highlight_radius_scale;
        self.outline = build_outline_layer(
            id.and_then(|id| self.index.get(id)),
            radius,
            outline_style(&self.config),
            &self.projector,
        );
        self.outline_dirty = true;
        true
    }

    fn redraw(&mut self) {
        self.texture
            .redraw(&self.index, &self.selection, &self.config.palette);
    }

    // ---- resize -------------------------------------------------------------

    /// Queues a viewport change (CSS pixels). Applied by the next frame
    /// after the debounce delay; the first request applies immediately.
    pub fn request_resize(&mut self, css_width: f64, css_height: f64, pixel_ratio: f64, now: Time) {
        if self.torn_down {
            return;
        }
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        };
        self.resize.push(
            Viewport {
                css_width: css_width.max(1.0),
                css_height: css_height.max(1.0),
                pixel_ratio,
            },
            now,
        );
    }

    fn apply_resize(&mut self, vp: Viewport) {
        self.camera.resize(vp.css_width, vp.css_height);
        let (w, h) = vp.physical();
        if let Some(surface) = self.surface.as_deref_mut() {
            surface.resize(w, h);
        }
        self.viewport = Some(vp);
    }

    // ---- frame --------------------------------------------------------------

    /// Runs one frame: pending resize, staged rotation, focus, autorotation,
    /// camera distance, then draw.
    pub fn tick(&mut self, now: Time) -> Frame {
        let frame = self.clock.tick(now);
        if self.torn_down {
            return frame;
        }

        if let Some(vp) = self.resize.poll(now) {
            self.apply_resize(vp);
        }

        self.commit_rotation();

        if let Some(id) = self.pending_focus.take() {
            if let Some(dir) = self
                .index
                .get(id)
                .and_then(|f| feature_direction(f, &self.projector))
            {
                self.focus.start(self.orientation, dir, now);
            }
        }
        if let Some(q) = self.focus.update(now) {
            self.orientation = q;
        }

        let inputs = IdleInputs {
            pointer_down: self.gestures.is_pointer_down(),
            animating: self.focus.is_active(),
            selected: self.selection.selected().is_some(),
            hovered: self.selection.hovered().is_some(),
        };
        self.last_idle = self.idle.evaluate(inputs, now, frame.dt_s());
        self.orientation = IdleAutorotator::apply(self.last_idle, self.orientation);

        self.camera.commit();
        self.render(frame);
        frame
    }

    fn commit_rotation(&mut self) {
        if self.staged_world == Quat::IDENTITY && self.staged_local == Quat::IDENTITY {
            return;
        }
        self.orientation = (self.staged_world * self.orientation * self.staged_local).normalize();
        self.staged_world = Quat::IDENTITY;
        self.staged_local = Quat::IDENTITY;
    }

    pub fn frame_view(&self, frame: Frame) -> FrameView {
        let radius = self.config.geometry.globe_radius;
        FrameView {
            frame,
            view: self.camera.view(),
            projection: self.camera.projection(),
            view_proj: self.camera.view_proj(),
            globe_model: CameraRig::model(self.orientation, radius),
            lines_model: CameraRig::model(self.orientation, 1.0),
            orientation: self.orientation,
            eye: self.camera.eye(),
            clear_color: self.config.palette.background,
            lighting: Lighting::default(),
        }
    }

    fn render(&mut self, frame: Frame) {
        let view = self.frame_view(frame);
        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        let full = std::mem::take(&mut self.full_upload);

        let texture_dirty = self.texture.take_dirty();
        if texture_dirty || full {
            surface.upload_map_texture(&self.texture);
        }
        if std::mem::take(&mut self.borders_dirty) || full {
            surface.set_lines(&self.borders);
        }
        if std::mem::take(&mut self.outline_dirty) || full {
            surface.set_lines(&self.outline);
        }
        surface.draw(&view);
    }

    // ---- events & lifecycle -------------------------------------------------

    pub fn drain_events(&mut self) -> Vec<Event<EngineEvent>> {
        self.events.drain()
    }

    /// Cancels the pending load, detaches input, stops frames and releases
    /// the surface, in that order. Later calls are no-ops.
    pub fn teardown(&mut self, host: &mut dyn EngineHost) {
        if self.torn_down {
            return;
        }
        self.loader.cancel();
        host.abort_load();
        host.detach_input();
        host.stop_frames();
        if let Some(mut surface) = self.surface.take() {
            surface.release();
        }
        self.gestures.reset();
        self.focus.cancel();
        self.pending_focus = None;
        self.resize.clear();
        self.torn_down = true;
        tracing::info!("globe torn down");
    }
}

fn border_style(config: &GlobeConfig) -> LayerStyle {
    LayerStyle::from_rgb(
        config.palette.borders,
        config.palette.borders_opacity,
        config.geometry.border_radius_scale as f32,
    )
}

fn outline_style(config: &GlobeConfig) -> LayerStyle {
    LayerStyle::from_rgb(
        config.palette.selected_stroke,
        1.0,
        config.geometry.highlight_radius_scale as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::math::GeoPoint;
    use scene::{FeatureIndexBuilder, Polygon, Ring};

    fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Polygon {
        Polygon::new(
            Ring::new(vec![
                GeoPoint::new(min_lon, min_lat),
                GeoPoint::new(max_lon, min_lat),
                GeoPoint::new(max_lon, max_lat),
                GeoPoint::new(min_lon, max_lat),
            ]),
            Vec::new(),
        )
        .unwrap()
    }

    fn engine() -> GlobeEngine {
        let mut config = GlobeConfig::default();
        config.texture.width = 360;
        config.texture.height = 180;
        let mut e = GlobeEngine::new(config, Time(0.0));
        e.request_resize(800.0, 600.0, 1.0, Time(0.0));
        e.tick(Time(0.0));
        e
    }

    fn index() -> FeatureIndex {
        let mut b = FeatureIndexBuilder::new();
        b.push(Some("AB".into()), None, vec![rect(-10.0, -10.0, 10.0, 10.0)]);
        b.push(None, None, vec![rect(40.0, -5.0, 50.0, 5.0)]);
        b.build()
    }

    #[test]
    fn tap_on_centre_selects_and_reports() {
        let mut e = engine();
        e.install_index(index());
        e.drain_events();

        e.pointer_down(1, 400.0, 300.0, Time(100.0));
        e.pointer_up(1, 401.0, 300.0, Time(200.0));

        assert_eq!(e.selected_code(), Some("AB"));
        let events: Vec<_> = e.drain_events().into_iter().map(|ev| ev.payload).collect();
        assert_eq!(
            events,
            vec![EngineEvent::SelectionChanged {
                code: Some("AB".into())
            }]
        );
        assert!(!e.outline().is_empty());
    }

    #[test]
    fn ocean_tap_keeps_selection() {
        let mut e = engine();
        e.install_index(index());
        e.set_selected_code(Some("ab"));
        e.drain_events();

        // corner of the viewport misses the sphere
        e.pointer_down(1, 2.0, 2.0, Time(100.0));
        e.pointer_up(1, 2.0, 2.0, Time(150.0));
        assert_eq!(e.selected_code(), Some("AB"));
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn drag_is_staged_until_the_next_frame() {
        let mut e = engine();
        let before = e.orientation();
        e.pointer_down(1, 400.0, 300.0, Time(100.0));
        e.pointer_move(1, 450.0, 320.0, Time(116.0));
        assert_eq!(e.orientation(), before);

        e.tick(Time(116.0));
        let expected = (Quat::from_axis_angle(Vec3::X, 20.0 * 0.004)
            * before
            * Quat::from_axis_angle(Vec3::Y, 50.0 * 0.004))
        .normalize();
        assert!(e.orientation().angle_to(expected) < 1e-6);
    }

    #[test]
    fn input_preempts_focus() {
        let mut e = engine();
        e.install_index(index());
        e.set_selected_code(Some("AB"));
        assert!(e.is_focusing());
        e.wheel(120.0, Time(10.0));
        assert!(!e.is_focusing());
    }

    #[test]
    fn hover_is_ignored_while_pressed() {
        let mut e = engine();
        e.install_index(index());
        e.pointer_hover(400.0, 300.0);
        assert_eq!(e.selection().hovered(), Some(FeatureId(0)));

        e.pointer_leave();
        e.pointer_down(7, 10.0, 10.0, Time(50.0));
        e.pointer_move(8, 400.0, 300.0, Time(60.0));
        assert_eq!(e.selection().hovered(), None);
    }

    #[test]
    fn resize_requests_are_debounced() {
        let mut e = engine();
        assert_eq!(e.camera().viewport(), [800.0, 600.0]);
        e.request_resize(400.0, 400.0, 3.0, Time(1000.0));
        e.tick(Time(1100.0));
        assert_eq!(e.camera().viewport(), [800.0, 600.0]);
        e.tick(Time(1150.0));
        assert_eq!(e.camera().viewport(), [400.0, 400.0]);
    }
}
