//! Input from the gesture collaborator, already reduced to map-level events.
//!
//! Recognizing drags and reading wheel deltas happens outside this crate;
//! this module only decides what each event does to the map.

use serde::{Deserialize, Serialize};

use panmap_core::{Point, Viewport};

use crate::canvas::Surface;
use crate::map::{Map, MapError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// A pointer-down the drag recognizer did not claim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Pixel position relative to the surface.
    pub x: f64,
    pub y: f64,
    pub button: PointerButton,
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Where on the map the pointer is.
    pub fn map_position(&self, viewport: &Viewport) -> Point {
        viewport.untransform_point(self.position())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    /// Pixel position relative to the surface.
    pub x: f64,
    pub y: f64,
    /// Wheel steps; positive zooms in.
    pub delta_y: f64,
    /// Pixels per step reported by the platform.
    pub delta_factor: f64,
}

impl WheelEvent {
    pub fn zoom_factor(&self, divisor: f64) -> f64 {
        (self.delta_y * self.delta_factor / divisor).exp()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    Wheel(WheelEvent),
    /// Per-frame pixel movement of an ongoing drag.
    Drag { dx: f64, dy: f64 },
    PointerDown(PointerEvent),
    Resize,
}

/// Whether the source should go on with its own handling of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResponse {
    AllowDefault,
    SuppressDefault,
}

impl From<bool> for EventResponse {
    fn from(allow: bool) -> Self {
        if allow {
            EventResponse::AllowDefault
        } else {
            EventResponse::SuppressDefault
        }
    }
}

impl<S: Surface> Map<S> {
    pub fn handle_event(&mut self, event: MapEvent) -> Result<EventResponse, MapError> {
        match event {
            MapEvent::Wheel(wheel) => {
                let factor = wheel.zoom_factor(self.config().wheel_divisor);
                self.viewport_mut().zoom_at_pixel(wheel.x, wheel.y, factor)?;
                Ok(EventResponse::SuppressDefault)
            }
            MapEvent::Drag { dx, dy } => {
                self.viewport_mut().pan_by_pixels(dx, dy)?;
                Ok(EventResponse::SuppressDefault)
            }
            MapEvent::PointerDown(pointer) => Ok(self.click(&pointer).into()),
            MapEvent::Resize => {
                self.notify_resize();
                Ok(EventResponse::AllowDefault)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;

    fn map() -> Map<RecordingCanvas> {
        Map::new(RecordingCanvas::new(800.0, 600.0))
    }

    #[test]
    fn test_wheel_zooms_around_cursor() {
        let mut map = map();
        map.viewport_mut().pan_by_pixels(37.0, -12.0).unwrap();
        let cursor = Point::new(250.0, 125.0);
        let under_cursor = map.viewport().untransform_point(cursor);

        let response = map
            .handle_event(MapEvent::Wheel(WheelEvent {
                x: cursor.x,
                y: cursor.y,
                delta_y: 3.0,
                delta_factor: 100.0,
            }))
            .unwrap();

        assert_eq!(response, EventResponse::SuppressDefault);
        assert!((map.viewport().scale() - 0.3_f64.exp()).abs() < 1e-12);
        let p = map.viewport().transform_point(under_cursor);
        assert!((p.x - cursor.x).abs() < 1e-9);
        assert!((p.y - cursor.y).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_down_zooms_out() {
        let wheel = WheelEvent {
            x: 0.0,
            y: 0.0,
            delta_y: -1.0,
            delta_factor: 100.0,
        };
        assert!(wheel.zoom_factor(1000.0) < 1.0);
    }

    #[test]
    fn test_overflowing_wheel_is_an_error() {
        let mut map = map();
        let result = map.handle_event(MapEvent::Wheel(WheelEvent {
            x: 0.0,
            y: 0.0,
            delta_y: 1e6,
            delta_factor: 1e6,
        }));
        assert!(matches!(result, Err(MapError::Viewport(_))));
        assert!((map.viewport().scale() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_drag_pans_and_requests_draw() {
        let mut map = map();
        map.handle_event(MapEvent::Drag { dx: 4.0, dy: 5.0 }).unwrap();
        map.handle_event(MapEvent::Drag { dx: 1.0, dy: 1.0 }).unwrap();
        assert_eq!(map.viewport().origin(), Point::new(5.0, 6.0));
        assert_eq!(map.run_until_idle(), 1);
    }

    #[test]
    fn test_pointer_down_goes_to_click_callback() {
        let mut map = map();
        let down = MapEvent::PointerDown(PointerEvent {
            x: 400.0,
            y: 300.0,
            button: PointerButton::Primary,
        });
        assert_eq!(map.handle_event(down).unwrap(), EventResponse::SuppressDefault);

        map.set_click_callback(|e| e.button == PointerButton::Primary);
        assert_eq!(map.handle_event(down).unwrap(), EventResponse::AllowDefault);
    }

    #[test]
    fn test_map_position_inverts_viewport() {
        let mut map = map();
        map.viewport_mut().zoom_at_pixel(0.0, 0.0, 2.0).unwrap();
        let event = PointerEvent {
            x: 40.0,
            y: 10.0,
            button: PointerButton::Secondary,
        };
        assert_eq!(event.map_position(map.viewport()), Point::new(20.0, 5.0));
    }

    #[test]
    fn test_events_parse_from_json() {
        let events: Vec<MapEvent> = serde_json::from_str(
            r#"[
                { "type": "drag", "dx": 1.0, "dy": 2.0 },
                { "type": "wheel", "x": 1.0, "y": 1.0, "delta_y": 1.0, "delta_factor": 100.0 },
                { "type": "pointer_down", "x": 3.0, "y": 4.0, "button": "primary" },
                { "type": "resize" }
            ]"#,
        )
        .unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], MapEvent::Drag { dx: 1.0, dy: 2.0 });
        assert_eq!(events[3], MapEvent::Resize);
    }
}
