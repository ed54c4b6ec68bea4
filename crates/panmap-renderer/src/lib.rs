//! # Panmap Renderer
//!
//! Owns a surface, a viewport and an ordered list of layers, and turns
//! bursts of redraw requests into single frames. Time is cooperative: the
//! owner advances the scheduler's clock and deferred draws and resizes run
//! as they come due.
//!
//! [`RecordingCanvas`] is a headless surface whose frames serialize to
//! JSON, for tests and inspection.

pub mod scheduler;
pub mod render_data;
pub mod canvas;
pub mod config;
pub mod input;
pub mod map;

pub use canvas::{RecordingCanvas, Surface};
pub use config::MapConfig;
pub use input::{EventResponse, MapEvent, PointerButton, PointerEvent, WheelEvent};
pub use map::{FrameStats, Map, MapError};
pub use render_data::{DrawCommand, RenderFrame};
pub use scheduler::{Scheduler, Slot, Task};
