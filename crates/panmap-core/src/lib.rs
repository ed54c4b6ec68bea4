//! # Panmap Core
//!
//! The map-space ↔ pixel-space viewport transform, the drawing-context
//! contract layers paint through, and the layer trait itself.
//!
//! Nothing here schedules or owns a surface; see `panmap-renderer` for that.

pub mod geometry;
pub mod draw;
pub mod viewport;
pub mod layer;
pub mod spatial;

pub use geometry::{Affine, BBox, Point, Vector};
pub use draw::{Color, DrawContext, DrawState, StateStack};
pub use viewport::{Viewport, ViewportError, ViewportState};
pub use layer::{Layer, LayerError, LayerId, LayerStack};
pub use spatial::{SpatialEntry, SpatialIndex};
