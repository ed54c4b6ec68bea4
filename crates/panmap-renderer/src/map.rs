use std::rc::Rc;

use log::{debug, info, warn};
use thiserror::Error;

use panmap_core::{
    Affine, DrawContext, DrawState, Layer, LayerId, LayerStack, Viewport, ViewportError,
};

use crate::canvas::Surface;
use crate::config::MapConfig;
use crate::input::PointerEvent;
use crate::scheduler::{Scheduler, Task};

// ── Errors ────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Viewport error: {0}")]
    Viewport(#[from] ViewportError),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

// ── Hooks ─────────────────────────────────────────────────────────────

/// Runs at the start of every frame, before the transform is reset.
pub type BeforeRenderHook = Box<dyn FnMut(&mut dyn DrawContext)>;
/// Returns `false` to tell the gesture source to suppress its default action.
pub type ClickCallback = Box<dyn FnMut(&PointerEvent) -> bool>;
/// Sizes the surface, typically from its container.
pub type ResizeFn<S> = Box<dyn FnMut(&mut S)>;

struct Resizer<S> {
    resize: ResizeFn<S>,
    delay_ms: u64,
}

/// Outcome of one drawn frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub layers_drawn: usize,
    pub layers_failed: usize,
    /// Layers that returned with a different stack depth than they got.
    pub layers_unbalanced: usize,
}

/// A viewport over a surface plus the ordered layers painted onto it.
///
/// Redraws are requested with [`Map::render`] and coalesced: the first
/// request of a burst schedules one draw `render_delay_ms` later and the
/// rest are dropped until that draw has run. The draw itself reads the
/// viewport and layer list as they are when it fires.
pub struct Map<S: Surface> {
    surface: S,
    viewport: Viewport,
    layers: LayerStack,
    scheduler: Scheduler,
    config: MapConfig,
    resizer: Option<Resizer<S>>,
    before_render: Option<BeforeRenderHook>,
    click_callback: Option<ClickCallback>,
    frames_drawn: u64,
    last_frame: Option<FrameStats>,
}

impl<S: Surface> Map<S> {
    pub fn new(surface: S) -> Self {
        Self::build(surface, MapConfig::default(), Viewport::new())
    }

    pub fn with_config(surface: S, config: MapConfig) -> Result<Self, MapError> {
        config.validate()?;
        let viewport = Viewport::from_state(config.initial_viewport)?;
        Ok(Self::build(surface, config, viewport))
    }

    fn build(surface: S, config: MapConfig, mut viewport: Viewport) -> Self {
        let scheduler = Scheduler::new();
        let handle = scheduler.clone();
        let delay_ms = config.render_delay_ms;
        viewport.set_draw_hook(move || {
            handle.request(Task::Draw, delay_ms);
        });

        Self {
            surface,
            viewport,
            layers: LayerStack::new(),
            scheduler,
            config,
            resizer: None,
            before_render: None,
            click_callback: None,
            frames_drawn: 0,
            last_frame: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutations through the viewport's own operations request a redraw
    /// via its draw hook.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn last_frame(&self) -> Option<FrameStats> {
        self.last_frame
    }

    // ── Layers ───────────────────────────────────────────────────────

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// Add a layer on top. Takes effect on the next draw.
    pub fn add_layer(&mut self, layer: Rc<dyn Layer>) -> LayerId {
        self.layers.push(layer)
    }

    pub fn insert_layer(&mut self, index: usize, layer: Rc<dyn Layer>) -> LayerId {
        self.layers.insert(index, layer)
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Option<Rc<dyn Layer>> {
        self.layers.remove(id)
    }

    pub fn clear_layers(&mut self) {
        self.layers.clear();
    }

    // ── Hooks ────────────────────────────────────────────────────────

    pub fn set_before_render(&mut self, hook: impl FnMut(&mut dyn DrawContext) + 'static) {
        self.before_render = Some(Box::new(hook));
    }

    pub fn clear_before_render(&mut self) {
        self.before_render = None;
    }

    pub fn set_click_callback(&mut self, callback: impl FnMut(&PointerEvent) -> bool + 'static) {
        self.click_callback = Some(Box::new(callback));
    }

    pub fn clear_click_callback(&mut self) {
        self.click_callback = None;
    }

    /// Forward a qualifying pointer interaction to the click callback.
    /// Without a callback the default action is suppressed.
    pub fn click(&mut self, event: &PointerEvent) -> bool {
        match self.click_callback.as_mut() {
            Some(callback) => callback(event),
            None => false,
        }
    }

    // ── Scheduling ───────────────────────────────────────────────────

    /// Request a redraw. Returns `true` if this call scheduled a draw,
    /// `false` if it was folded into one already pending.
    pub fn render(&self) -> bool {
        self.scheduler.request(Task::Draw, self.config.render_delay_ms)
    }

    /// Install the function that sizes the surface. It runs once right
    /// away, then at most once per `delay_ms` in response to
    /// [`Map::notify_resize`]. Every run is followed by a `render()`.
    pub fn install_resizer(&mut self, resize: impl FnMut(&mut S) + 'static, delay_ms: u64) {
        info!("Installing resizer (rate limit {delay_ms} ms)");
        self.resizer = Some(Resizer {
            resize: Box::new(resize),
            delay_ms,
        });
        self.resize_now();
    }

    /// Report that the surface's container changed size. Returns `true`
    /// if this call scheduled a resize.
    pub fn notify_resize(&self) -> bool {
        match &self.resizer {
            Some(resizer) => self.scheduler.request(Task::Resize, resizer.delay_ms),
            None => {
                debug!("Resize notification ignored, no resizer installed");
                false
            }
        }
    }

    /// Center the surface on map coordinate `(x, y)`.
    pub fn focus_map_coordinates(&mut self, x: f64, y: f64) {
        let center = self.surface.center();
        self.viewport.focus_map_coordinates(x, y, center.x, center.y);
    }

    /// Move the clock forward by `ms`, running every deferred action that
    /// comes due on the way. Returns how many ran.
    pub fn advance(&mut self, ms: u64) -> usize {
        let deadline = self.scheduler.now().saturating_add(ms);
        let mut fired = 0;
        while let Some((task, due_at)) = self.scheduler.next_due(deadline) {
            self.scheduler.advance_to(due_at);
            self.run_task(task);
            fired += 1;
        }
        self.scheduler.advance_to(deadline);
        fired
    }

    /// Advance until nothing is pending.
    pub fn run_until_idle(&mut self) -> usize {
        let mut fired = 0;
        while let Some(due_at) = self.scheduler.next_deadline() {
            let wait = due_at.saturating_sub(self.scheduler.now());
            fired += self.advance(wait);
        }
        fired
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Draw => {
                let stats = self.draw_frame();
                self.last_frame = Some(stats);
                self.scheduler.complete(Task::Draw);
            }
            Task::Resize => {
                self.resize_now();
                self.scheduler.complete(Task::Resize);
            }
        }
    }

    fn resize_now(&mut self) {
        if let Some(resizer) = self.resizer.as_mut() {
            (resizer.resize)(&mut self.surface);
            debug!(
                "Surface resized to {}x{}",
                self.surface.width(),
                self.surface.height()
            );
        }
        self.render();
    }

    // ── Composition ──────────────────────────────────────────────────

    fn draw_frame(&mut self) -> FrameStats {
        let Map {
            surface,
            viewport,
            layers,
            before_render,
            frames_drawn,
            ..
        } = self;
        let ctx = surface.context();

        if let Some(hook) = before_render.as_mut() {
            hook(&mut *ctx);
        }
        ctx.set_transform(Affine::IDENTITY);
        viewport.apply_forward(ctx);

        *frames_drawn += 1;
        let mut stats = FrameStats {
            frame: *frames_drawn,
            ..FrameStats::default()
        };

        for entry in layers.iter() {
            let depth = ctx.depth();
            let entry_state = ctx.state();
            ctx.save();
            let result = entry.layer.render(ctx, viewport);

            if ctx.depth() != depth + 1 {
                warn!(
                    "Layer `{}` left the state stack at {} (expected {})",
                    entry.layer.name(),
                    ctx.depth(),
                    depth + 1
                );
                stats.layers_unbalanced += 1;
            }
            unwind(ctx, depth, entry_state);

            match result {
                Ok(()) => stats.layers_drawn += 1,
                Err(err) => {
                    warn!("Layer `{}` skipped: {}", entry.layer.name(), err);
                    stats.layers_failed += 1;
                }
            }
        }

        debug!(
            "Frame {} drawn: {} layers, {} failed",
            stats.frame, stats.layers_drawn, stats.layers_failed
        );
        stats
    }
}

/// Bring `ctx` back to exactly `depth` saved states, holding `entry`,
/// after a layer ran.
fn unwind(ctx: &mut dyn DrawContext, depth: usize, entry: DrawState) {
    while ctx.depth() > depth {
        ctx.restore();
    }
    // A layer that popped our save may have drawn on, or saved, outer state.
    // States saved before the loop that it popped are refilled with `entry`.
    ctx.set_state(entry);
    while ctx.depth() < depth {
        ctx.save();
    }
}
