use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::draw::DrawContext;
use crate::geometry::{BBox, Point, Vector};

// ── Errors ────────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewportError {
    #[error("Invalid argument `{name}` = {value}: {reason}")]
    InvalidArgument {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl ViewportError {
    fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        ViewportError::InvalidArgument {
            name,
            value,
            reason,
        }
    }
}

// ── State ─────────────────────────────────────────────────────────────

/// Plain snapshot of a viewport transform, free of hooks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    /// Pixels per map unit.
    pub scale: f64,
    /// Pixel position of map coordinate (0, 0).
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

/// Called after a viewport mutation with the new state.
pub type ChangeHook = Box<dyn FnMut(&ViewportState)>;
/// Called when a viewport mutation needs the surface redrawn.
pub type DrawHook = Box<dyn FnMut()>;

/// The map-space ↔ pixel-space transform `T(p) = scale · p + origin`.
///
/// `scale` is always finite and strictly positive. The draw hook and the
/// change hook each hold at most one callback; `zoom_at_pixel` and
/// `pan_by_pixels` fire the draw hook first, then the change hook.
pub struct Viewport {
    scale: f64,
    origin_x: f64,
    origin_y: f64,
    draw_hook: Option<DrawHook>,
    on_change: Option<ChangeHook>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("scale", &self.scale)
            .field("origin_x", &self.origin_x)
            .field("origin_y", &self.origin_y)
            .field("draw_hook", &self.draw_hook.is_some())
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            origin_x: 0.0,
            origin_y: 0.0,
            draw_hook: None,
            on_change: None,
        }
    }

    pub fn from_state(state: ViewportState) -> Result<Self, ViewportError> {
        if !(state.scale.is_finite() && state.scale > 0.0) {
            return Err(ViewportError::invalid(
                "scale",
                state.scale,
                "must be finite and positive",
            ));
        }
        if !state.origin_x.is_finite() {
            return Err(ViewportError::invalid("origin_x", state.origin_x, "must be finite"));
        }
        if !state.origin_y.is_finite() {
            return Err(ViewportError::invalid("origin_y", state.origin_y, "must be finite"));
        }
        Ok(Self {
            scale: state.scale,
            origin_x: state.origin_x,
            origin_y: state.origin_y,
            ..Self::new()
        })
    }

    pub fn state(&self) -> ViewportState {
        ViewportState {
            scale: self.scale,
            origin_x: self.origin_x,
            origin_y: self.origin_y,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn origin(&self) -> Point {
        Point::new(self.origin_x, self.origin_y)
    }

    // ── Hooks ────────────────────────────────────────────────────────

    pub fn set_draw_hook(&mut self, hook: impl FnMut() + 'static) {
        self.draw_hook = Some(Box::new(hook));
    }

    pub fn clear_draw_hook(&mut self) {
        self.draw_hook = None;
    }

    pub fn set_on_change(&mut self, hook: impl FnMut(&ViewportState) + 'static) {
        self.on_change = Some(Box::new(hook));
    }

    pub fn clear_on_change(&mut self) {
        self.on_change = None;
    }

    fn notify(&mut self) {
        if let Some(draw) = self.draw_hook.as_mut() {
            draw();
        }
        let state = self.state();
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(&state);
        }
    }

    // ── Context transforms ───────────────────────────────────────────

    /// Append `T` to the context transform: translate, then scale.
    pub fn apply_forward(&self, ctx: &mut dyn DrawContext) {
        ctx.translate(self.origin_x, self.origin_y);
        ctx.scale(self.scale, self.scale);
    }

    /// Append `T⁻¹` to the context transform: scale, then translate.
    pub fn apply_inverse(&self, ctx: &mut dyn DrawContext) {
        ctx.scale(1.0 / self.scale, 1.0 / self.scale);
        ctx.translate(-self.origin_x, -self.origin_y);
    }

    /// Append `T_self ∘ T_base⁻¹`, so content authored under `base`
    /// lands where it belongs under this viewport.
    pub fn apply_delta(&self, ctx: &mut dyn DrawContext, base: &Viewport) {
        self.apply_forward(ctx);
        base.apply_inverse(ctx);
    }

    // ── Coordinate conversion ────────────────────────────────────────

    pub fn transform_point(&self, point: Point) -> Point {
        Point::new(
            self.scale * point.x + self.origin_x,
            self.scale * point.y + self.origin_y,
        )
    }

    pub fn untransform_point(&self, point: Point) -> Point {
        Point::new(
            (point.x - self.origin_x) / self.scale,
            (point.y - self.origin_y) / self.scale,
        )
    }

    pub fn transform_vector(&self, vector: Vector) -> Vector {
        Vector::new(self.scale * vector.x, self.scale * vector.y)
    }

    pub fn untransform_vector(&self, vector: Vector) -> Vector {
        Vector::new(vector.x / self.scale, vector.y / self.scale)
    }

    pub fn transform_distance(&self, distance: f64) -> f64 {
        self.scale * distance
    }

    pub fn untransform_distance(&self, distance: f64) -> f64 {
        distance / self.scale
    }

    /// Map-space rectangle visible on a surface of the given pixel size.
    pub fn visible_bounds(&self, width: f64, height: f64) -> BBox {
        BBox::from_corners(
            self.untransform_point(Point::new(0.0, 0.0)),
            self.untransform_point(Point::new(width, height)),
        )
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Multiply the scale by `factor`, keeping the map point under
    /// `(pixel_x, pixel_y)` fixed on screen.
    pub fn zoom_at_pixel(
        &mut self,
        pixel_x: f64,
        pixel_y: f64,
        factor: f64,
    ) -> Result<(), ViewportError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ViewportError::invalid(
                "factor",
                factor,
                "must be finite and positive",
            ));
        }
        if !pixel_x.is_finite() {
            return Err(ViewportError::invalid("pixel_x", pixel_x, "must be finite"));
        }
        if !pixel_y.is_finite() {
            return Err(ViewportError::invalid("pixel_y", pixel_y, "must be finite"));
        }
        let scale = self.scale * factor;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ViewportError::invalid(
                "factor",
                factor,
                "resulting scale is not finite and positive",
            ));
        }

        let origin_x = self.origin_x + (pixel_x - self.origin_x) * (1.0 - factor);
        let origin_y = self.origin_y + (pixel_y - self.origin_y) * (1.0 - factor);
        if !origin_x.is_finite() || !origin_y.is_finite() {
            return Err(ViewportError::invalid(
                "factor",
                factor,
                "resulting origin is not finite",
            ));
        }

        self.scale = scale;
        self.origin_x = origin_x;
        self.origin_y = origin_y;
        log::trace!("zoom x{factor} at ({pixel_x}, {pixel_y}) -> scale {scale}");
        self.notify();
        Ok(())
    }

    /// Shift the map by `(dx, dy)` pixels. Fails without side effects if
    /// the shift or the resulting origin is not finite.
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) -> Result<(), ViewportError> {
        if !dx.is_finite() {
            return Err(ViewportError::invalid("dx", dx, "must be finite"));
        }
        if !dy.is_finite() {
            return Err(ViewportError::invalid("dy", dy, "must be finite"));
        }
        let origin_x = self.origin_x + dx;
        let origin_y = self.origin_y + dy;
        if !origin_x.is_finite() || !origin_y.is_finite() {
            return Err(ViewportError::invalid(
                "dx",
                dx,
                "resulting origin is not finite",
            ));
        }

        self.origin_x = origin_x;
        self.origin_y = origin_y;
        self.notify();
        Ok(())
    }

    /// Place map coordinate `(x, y)` exactly on pixel `(target_x, target_y)`.
    /// Scale is kept and no hooks fire; callers decide whether to redraw.
    pub fn focus_map_coordinates(&mut self, x: f64, y: f64, target_x: f64, target_y: f64) {
        self.origin_x = target_x - self.scale * x;
        self.origin_y = target_y - self.scale * y;
    }

    /// Copy of the transform alone, without hooks, for later delta composition.
    pub fn clone_for_transformation(&self) -> Viewport {
        Viewport {
            scale: self.scale,
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            draw_hook: None,
            on_change: None,
        }
    }
}
