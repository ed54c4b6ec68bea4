use serde::{Deserialize, Serialize};

use crate::geometry::{Affine, Point};

/// RGBA paint color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// The part of a drawing context that `save` / `restore` scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawState {
    pub transform: Affine,
    pub fill: Color,
    pub stroke: Color,
    pub line_width: f64,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
        }
    }
}

/// A 2D immediate-mode drawing context.
///
/// Mirrors the transform and state-stack model of browser canvases:
/// `translate` and `scale` post-multiply the current transform, `save`
/// pushes the whole [`DrawState`] and `restore` pops it. Restoring an
/// empty stack does nothing.
pub trait DrawContext {
    fn save(&mut self);
    fn restore(&mut self);
    /// Number of states currently saved on the stack.
    fn depth(&self) -> usize;

    fn transform(&self) -> Affine;
    fn set_transform(&mut self, transform: Affine);

    /// The full current state, transform and styles alike.
    fn state(&self) -> DrawState;
    fn set_state(&mut self, state: DrawState);

    fn translate(&mut self, tx: f64, ty: f64) {
        let t = self.transform().translate(tx, ty);
        self.set_transform(t);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        let t = self.transform().scale(sx, sy);
        self.set_transform(t);
    }

    fn set_fill_style(&mut self, color: Color);
    fn set_stroke_style(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);

    /// Reset the pixels of a rectangle to transparent.
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn stroke_line(&mut self, from: Point, to: Point);
}

/// Current [`DrawState`] plus the saved stack. Context implementations
/// embed this and forward the state half of [`DrawContext`] to it.
#[derive(Debug, Clone, Default)]
pub struct StateStack {
    current: DrawState,
    saved: Vec<DrawState>,
}

impl StateStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &DrawState {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut DrawState {
        &mut self.current
    }

    pub fn save(&mut self) {
        self.saved.push(self.current);
    }

    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.current = state;
        }
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Drop all saved states and return to the default state.
    pub fn reset(&mut self) {
        self.current = DrawState::default();
        self.saved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_returns_saved_state() {
        let mut stack = StateStack::new();
        stack.current_mut().fill = Color::rgb(255, 0, 0);
        stack.save();
        stack.current_mut().fill = Color::rgb(0, 255, 0);
        stack.current_mut().transform = Affine::IDENTITY.scale(3.0, 3.0);
        assert_eq!(stack.depth(), 1);

        stack.restore();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current().fill, Color::rgb(255, 0, 0));
        assert_eq!(stack.current().transform, Affine::IDENTITY);
    }

    #[test]
    fn test_restore_on_empty_stack_is_noop() {
        let mut stack = StateStack::new();
        stack.current_mut().line_width = 4.0;
        stack.restore();
        assert_eq!(stack.depth(), 0);
        assert!((stack.current().line_width - 4.0).abs() < 1e-10);
    }
}
