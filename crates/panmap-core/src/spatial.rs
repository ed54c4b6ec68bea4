//! Culling support for layers with many small items.
//!
//! A layer indexes the map-space bounds of its items once, then asks per
//! frame which of them fall inside [`Viewport::visible_bounds`].

use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::BBox;
use crate::viewport::Viewport;

/// Map-space bounds of one item, by its position in the layer's item list.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    pub item_index: usize,
    pub bbox: BBox,
}

fn envelope_of(bbox: &BBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min.x, bbox.min.y], [bbox.max.x, bbox.max.y])
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        envelope_of(&self.bbox)
    }
}

/// Read-only R-tree over a layer's items, bulk loaded up front.
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    pub fn build(entries: Vec<SpatialEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Items touching a map-space box, in no particular order.
    pub fn query_bbox(&self, bbox: &BBox) -> Vec<&SpatialEntry> {
        self.tree
            .locate_in_envelope_intersecting(&envelope_of(bbox))
            .collect()
    }

    /// Items at least partly on screen for a surface of the given pixel size.
    pub fn query_visible(
        &self,
        viewport: &Viewport,
        width: f64,
        height: f64,
    ) -> Vec<&SpatialEntry> {
        self.query_bbox(&viewport.visible_bounds(width, height))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::viewport::ViewportState;

    /// One item near the map origin and one far off to the bottom right.
    fn index() -> SpatialIndex {
        SpatialIndex::build(vec![
            SpatialEntry {
                item_index: 0,
                bbox: BBox::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0)),
            },
            SpatialEntry {
                item_index: 1,
                bbox: BBox::new(Point::new(200.0, 200.0), Point::new(210.0, 210.0)),
            },
        ])
    }

    fn indices(entries: Vec<&SpatialEntry>) -> Vec<usize> {
        let mut out: Vec<usize> = entries.iter().map(|e| e.item_index).collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn test_panning_changes_visible_items() {
        let index = index();
        let mut vp = Viewport::new();
        assert_eq!(indices(index.query_visible(&vp, 100.0, 100.0)), vec![0]);

        // Bring map (200, 200) to the top-left corner.
        vp.focus_map_coordinates(200.0, 200.0, 0.0, 0.0);
        assert_eq!(indices(index.query_visible(&vp, 100.0, 100.0)), vec![1]);
    }

    #[test]
    fn test_zooming_out_reveals_everything() {
        let index = index();
        let state = ViewportState {
            scale: 0.1,
            ..Default::default()
        };
        let vp = Viewport::from_state(state).unwrap();
        assert_eq!(indices(index.query_visible(&vp, 100.0, 100.0)), vec![0, 1]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_item_partly_on_screen_is_kept() {
        let index = index();
        let mut vp = Viewport::new();
        // Only the right half of item 0 remains on screen.
        vp.focus_map_coordinates(5.0, 0.0, 0.0, 0.0);
        assert_eq!(indices(index.query_visible(&vp, 50.0, 50.0)), vec![0]);
    }
}
