use serde::{Deserialize, Serialize};

use panmap_core::{Affine, BBox, Color, Point, ViewportState};

/// A paint operation as recorded by [`crate::RecordingCanvas`], together
/// with the transform that was current when it was issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    ClearRect {
        transform: Affine,
        /// [x, y, width, height] in the coordinates the caller drew in.
        rect: [f64; 4],
    },
    FillRect {
        transform: Affine,
        rect: [f64; 4],
        color: Color,
    },
    StrokeLine {
        transform: Affine,
        from: Point,
        to: Point,
        color: Color,
        line_width: f64,
    },
}

impl DrawCommand {
    pub fn transform(&self) -> Affine {
        match self {
            DrawCommand::ClearRect { transform, .. }
            | DrawCommand::FillRect { transform, .. }
            | DrawCommand::StrokeLine { transform, .. } => *transform,
        }
    }

    /// Pixel-space bounding box of the geometry, line width not included.
    pub fn pixel_bounds(&self) -> BBox {
        let t = self.transform();
        match self {
            DrawCommand::ClearRect { rect, .. } | DrawCommand::FillRect { rect, .. } => {
                let [x, y, w, h] = *rect;
                let corners = [
                    t.apply(Point::new(x, y)),
                    t.apply(Point::new(x + w, y)),
                    t.apply(Point::new(x, y + h)),
                    t.apply(Point::new(x + w, y + h)),
                ];
                let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
                let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
                let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
                let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
                BBox::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
            }
            DrawCommand::StrokeLine { from, to, .. } => {
                BBox::from_corners(t.apply(*from), t.apply(*to))
            }
        }
    }
}

/// Everything painted during one frame, serializable for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderFrame {
    pub frame: u64,
    pub width: f64,
    pub height: f64,
    pub viewport: ViewportState,
    pub commands: Vec<DrawCommand>,
}

impl RenderFrame {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
