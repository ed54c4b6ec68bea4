use panmap_core::{Affine, Color, DrawContext, DrawState, Point, StateStack, Viewport};

use crate::render_data::{DrawCommand, RenderFrame};

/// A drawable surface: a pixel size plus the 2D context that paints on it.
pub trait Surface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn context(&mut self) -> &mut dyn DrawContext;

    fn center(&self) -> Point {
        Point::new(self.width() / 2.0, self.height() / 2.0)
    }
}

/// Headless surface that records paint operations instead of rasterizing.
///
/// Follows canvas semantics: `restore` on an empty stack is ignored, and
/// resizing drops all drawing state and recorded output.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    width: f64,
    height: f64,
    state: StateStack,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            state: StateStack::new(),
            commands: Vec::new(),
        }
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.state.reset();
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Drain the recorded commands into a frame snapshot.
    pub fn take_frame(&mut self, frame: u64, viewport: &Viewport) -> RenderFrame {
        RenderFrame {
            frame,
            width: self.width,
            height: self.height,
            viewport: viewport.state(),
            commands: self.take_commands(),
        }
    }

    pub fn fill_style(&self) -> Color {
        self.state.current().fill
    }
}

impl Surface for RecordingCanvas {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn context(&mut self) -> &mut dyn DrawContext {
        self
    }
}

impl DrawContext for RecordingCanvas {
    fn save(&mut self) {
        self.state.save();
    }

    fn restore(&mut self) {
        self.state.restore();
    }

    fn depth(&self) -> usize {
        self.state.depth()
    }

    fn transform(&self) -> Affine {
        self.state.current().transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.state.current_mut().transform = transform;
    }

    fn state(&self) -> DrawState {
        *self.state.current()
    }

    fn set_state(&mut self, state: DrawState) {
        *self.state.current_mut() = state;
    }

    fn set_fill_style(&mut self, color: Color) {
        self.state.current_mut().fill = color;
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.state.current_mut().stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.current_mut().line_width = width;
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let transform = self.transform();
        self.commands.push(DrawCommand::ClearRect {
            transform,
            rect: [x, y, width, height],
        });
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let state = self.state.current();
        self.commands.push(DrawCommand::FillRect {
            transform: state.transform,
            rect: [x, y, width, height],
            color: state.fill,
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point) {
        let state = self.state.current();
        self.commands.push(DrawCommand::StrokeLine {
            transform: state.transform,
            from,
            to,
            color: state.stroke,
            line_width: state.line_width,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_capture_current_transform_and_style() {
        let mut canvas = RecordingCanvas::new(200.0, 100.0);
        canvas.translate(10.0, 0.0);
        canvas.set_fill_style(Color::rgb(1, 2, 3));
        canvas.fill_rect(0.0, 0.0, 5.0, 5.0);

        match &canvas.commands()[0] {
            DrawCommand::FillRect {
                transform,
                color,
                ..
            } => {
                assert_eq!(*transform, Affine::IDENTITY.translate(10.0, 0.0));
                assert_eq!(*color, Color::rgb(1, 2, 3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_resize_resets_state() {
        let mut canvas = RecordingCanvas::new(200.0, 100.0);
        canvas.save();
        canvas.scale(2.0, 2.0);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0);

        canvas.set_size(640.0, 480.0);
        assert_eq!(canvas.depth(), 0);
        assert_eq!(canvas.transform(), Affine::IDENTITY);
        assert!(canvas.commands().is_empty());
        assert_eq!(canvas.center(), Point::new(320.0, 240.0));
    }

    #[test]
    fn test_take_frame_drains_commands() {
        let mut canvas = RecordingCanvas::new(10.0, 10.0);
        canvas.stroke_line(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        let frame = canvas.take_frame(3, &Viewport::new());
        assert_eq!(frame.frame, 3);
        assert_eq!(frame.commands.len(), 1);
        assert!(canvas.commands().is_empty());
    }
}
