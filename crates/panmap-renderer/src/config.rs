use serde::{Deserialize, Serialize};

use panmap_core::{Viewport, ViewportState};

use crate::map::MapError;

/// Tunables for a [`crate::Map`]. Missing JSON fields take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Delay between the first `render()` of a burst and the draw.
    pub render_delay_ms: u64,
    /// Rate limit for resize notifications when the caller has no preference.
    pub resize_delay_ms: u64,
    /// Wheel zoom factor is `exp(delta_y * delta_factor / wheel_divisor)`.
    pub wheel_divisor: f64,
    pub initial_viewport: ViewportState,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            render_delay_ms: 10,
            resize_delay_ms: 100,
            wheel_divisor: 1000.0,
            initial_viewport: ViewportState::default(),
        }
    }
}

impl MapConfig {
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if !self.wheel_divisor.is_finite() || self.wheel_divisor == 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "wheel_divisor must be finite and non-zero, got {}",
                self.wheel_divisor
            )));
        }
        Viewport::from_state(self.initial_viewport)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = MapConfig::from_json(r#"{ "render_delay_ms": 16 }"#).unwrap();
        assert_eq!(config.render_delay_ms, 16);
        assert_eq!(config.resize_delay_ms, 100);
        assert!((config.wheel_divisor - 1000.0).abs() < 1e-10);
        assert_eq!(config.initial_viewport, ViewportState::default());
    }

    #[test]
    fn test_rejects_zero_initial_scale() {
        let json = r#"{ "initial_viewport": { "scale": 0.0, "origin_x": 0.0, "origin_y": 0.0 } }"#;
        assert!(matches!(MapConfig::from_json(json), Err(MapError::Viewport(_))));
    }

    #[test]
    fn test_rejects_zero_wheel_divisor() {
        let json = r#"{ "wheel_divisor": 0.0 }"#;
        assert!(matches!(MapConfig::from_json(json), Err(MapError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(MapConfig::from_json("{ nope"), Err(MapError::Json(_))));
    }
}
