use std::cell::Cell;
use std::rc::Rc;

use panmap_core::{
    BBox, Color, DrawContext, Layer, LayerError, Point, SpatialEntry, SpatialIndex, Viewport,
};

/// Pixel size of the surface, shared between the resizer and the layers
/// that need to know how much of the map is visible.
pub type SurfaceSize = Rc<Cell<(f64, f64)>>;

/// Past this many lines per axis the grid is skipped.
const MAX_GRID_LINES: f64 = 512.0;

/// Axis lines every `spacing` map units across the visible area.
pub struct GridLayer {
    pub spacing: f64,
    pub color: Color,
    pub size: SurfaceSize,
}

impl Layer for GridLayer {
    fn render(&self, ctx: &mut dyn DrawContext, viewport: &Viewport) -> Result<(), LayerError> {
        if self.spacing <= 0.0 {
            return Err(LayerError::Render(format!(
                "grid spacing must be positive, got {}",
                self.spacing
            )));
        }
        let (width, height) = self.size.get();
        let bounds = viewport.visible_bounds(width, height);
        if bounds.width().max(bounds.height()) / self.spacing > MAX_GRID_LINES {
            log::debug!("grid too dense at scale {}, skipped", viewport.scale());
            return Ok(());
        }

        ctx.set_stroke_style(self.color);
        // Keep lines one pixel wide at every zoom level.
        ctx.set_line_width(viewport.untransform_distance(1.0));

        let mut x = (bounds.min.x / self.spacing).floor() * self.spacing;
        while x <= bounds.max.x {
            ctx.stroke_line(Point::new(x, bounds.min.y), Point::new(x, bounds.max.y));
            x += self.spacing;
        }
        let mut y = (bounds.min.y / self.spacing).floor() * self.spacing;
        while y <= bounds.max.y {
            ctx.stroke_line(Point::new(bounds.min.x, y), Point::new(bounds.max.x, y));
            y += self.spacing;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "grid"
    }
}

#[derive(Debug, Clone)]
pub struct Marker {
    pub position: Point,
    pub color: Color,
}

/// Square markers of constant pixel size, culled through an R-tree.
pub struct MarkerLayer {
    markers: Vec<Marker>,
    index: SpatialIndex,
    size_px: f64,
    surface: SurfaceSize,
}

impl MarkerLayer {
    pub fn new(markers: Vec<Marker>, size_px: f64, surface: SurfaceSize) -> Self {
        let entries = markers
            .iter()
            .enumerate()
            .map(|(item_index, m)| SpatialEntry {
                item_index,
                bbox: BBox::new(m.position, m.position),
            })
            .collect();
        Self {
            markers,
            index: SpatialIndex::build(entries),
            size_px,
            surface,
        }
    }

    pub fn marker_count(&self) -> usize {
        self.index.len()
    }

    /// Indices of the markers within `radius` map units of `at`, box-wise.
    pub fn hit_test(&self, at: Point, radius: f64) -> Vec<usize> {
        let area = BBox::new(at.translate(-radius, -radius), at.translate(radius, radius));
        let mut hits: Vec<usize> = self
            .index
            .query_bbox(&area)
            .into_iter()
            .map(|e| e.item_index)
            .collect();
        hits.sort_unstable();
        hits
    }

    pub fn marker(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }
}

impl Layer for MarkerLayer {
    fn render(&self, ctx: &mut dyn DrawContext, viewport: &Viewport) -> Result<(), LayerError> {
        let (width, height) = self.surface.get();
        let half = viewport.untransform_distance(self.size_px / 2.0);

        let mut visible = self.index.query_visible(viewport, width, height);
        visible.sort_by_key(|e| e.item_index);
        let shown = visible.len();
        for entry in visible {
            let marker = &self.markers[entry.item_index];
            ctx.set_fill_style(marker.color);
            ctx.fill_rect(
                marker.position.x - half,
                marker.position.y - half,
                2.0 * half,
                2.0 * half,
            );
        }
        log::trace!("{} of {} markers visible", shown, self.marker_count());
        Ok(())
    }

    fn name(&self) -> &str {
        "markers"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panmap_renderer::{DrawCommand, RecordingCanvas};

    fn marker(x: f64, y: f64) -> Marker {
        Marker {
            position: Point::new(x, y),
            color: Color::WHITE,
        }
    }

    #[test]
    fn test_markers_outside_view_are_culled() {
        let size: SurfaceSize = Rc::new(Cell::new((100.0, 100.0)));
        let layer = MarkerLayer::new(
            vec![marker(10.0, 10.0), marker(500.0, 500.0)],
            4.0,
            size,
        );
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        layer.render(&mut canvas, &Viewport::new()).unwrap();
        assert_eq!(canvas.commands().len(), 1);
    }

    #[test]
    fn test_marker_pixel_size_is_zoom_independent() {
        let size: SurfaceSize = Rc::new(Cell::new((100.0, 100.0)));
        let layer = MarkerLayer::new(
            vec![marker(5.0, 5.0)],
            4.0,
            size,
        );
        let mut viewport = Viewport::new();
        viewport.zoom_at_pixel(0.0, 0.0, 8.0).unwrap();

        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        viewport.apply_forward(&mut canvas);
        layer.render(&mut canvas, &viewport).unwrap();

        match &canvas.commands()[0] {
            cmd @ DrawCommand::FillRect { .. } => {
                let bb = cmd.pixel_bounds();
                assert!((bb.width() - 4.0).abs() < 1e-9);
                assert!((bb.center().x - 40.0).abs() < 1e-9);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_grid_rejects_bad_spacing() {
        let grid = GridLayer {
            spacing: 0.0,
            color: Color::BLACK,
            size: Rc::new(Cell::new((10.0, 10.0))),
        };
        let mut canvas = RecordingCanvas::new(10.0, 10.0);
        assert!(grid.render(&mut canvas, &Viewport::new()).is_err());
    }

    #[test]
    fn test_hit_test_finds_markers_near_point() {
        let size: SurfaceSize = Rc::new(Cell::new((100.0, 100.0)));
        let layer = MarkerLayer::new(
            vec![marker(0.0, 0.0), marker(3.0, 0.0), marker(50.0, 50.0)],
            4.0,
            size,
        );
        assert_eq!(layer.hit_test(Point::new(1.0, 0.0), 2.5), vec![0, 1]);
        assert_eq!(layer.hit_test(Point::new(49.0, 49.0), 2.0), vec![2]);
        assert!(layer.hit_test(Point::new(20.0, 20.0), 2.0).is_empty());
        assert_eq!(layer.marker(2).map(|m| m.position), Some(Point::new(50.0, 50.0)));
    }
}
