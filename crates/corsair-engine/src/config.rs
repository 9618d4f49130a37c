//! Simulation tuning.
//!
//! [`SimConfig`] groups every tunable constant of the simulation by
//! concern. Each section falls back to its defaults field-by-field, so a
//! JSON document only needs to name the values it overrides:
//!
//! ```
//! use corsair_engine::config::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{ "player": { "run_speed": 6.0 } }"#).unwrap();
//! assert_eq!(config.player.run_speed, 6.0);
//! assert_eq!(config.player.jump_speed, 9.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Gravity, terminal velocity and frame-delta clamping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration in tiles/s^2.
    pub gravity: f32,
    /// Cap on downward speed in tiles/s.
    pub max_fall_speed: f32,
    /// Largest frame delta the simulation accepts, in seconds.
    pub max_dt: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 24.0,
            max_fall_speed: 9.5,
            max_dt: 0.1,
        }
    }
}

/// Player-controlled movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub run_speed: f32,
    /// Initial upward speed of a jump.
    pub jump_speed: f32,
    /// Downward speed above which the fall animation plays.
    pub fall_threshold: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            run_speed: 5.0,
            jump_speed: 9.5,
            fall_threshold: 0.5,
        }
    }
}

/// AI movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub patrol_speed: f32,
    pub charge_speed: f32,
    /// Seek range, in multiples of the target's mask width.
    pub seek_widths: f32,
    /// Largest difference between feet heights still counted as the same row.
    pub row_tolerance: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            patrol_speed: 1.5,
            charge_speed: 4.0,
            seek_widths: 4.0,
            row_tolerance: 0.5,
        }
    }
}

/// Viewport size and follow hysteresis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Viewport width in tiles.
    pub view_width: f32,
    /// Viewport height in tiles.
    pub view_height: f32,
    /// Largest lead the focus accumulates before the camera pans.
    pub focus_bound: f32,
    /// Closest the target may come to either horizontal viewport edge.
    pub edge_margin: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            view_width: 8.0,
            view_height: 6.0,
            focus_bound: 0.5,
            edge_margin: 1.5,
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    pub enemy: EnemyConfig,
    pub camera: CameraConfig,
}

fn require(ok: bool, field: &'static str, reason: impl Into<String>) -> Result<(), EngineError> {
    if ok {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig {
            field,
            reason: reason.into(),
        })
    }
}

fn positive(value: f32, field: &'static str) -> Result<(), EngineError> {
    require(
        value.is_finite() && value > 0.0,
        field,
        format!("must be positive and finite, got {value}"),
    )
}

fn non_negative(value: f32, field: &'static str) -> Result<(), EngineError> {
    require(
        value.is_finite() && value >= 0.0,
        field,
        format!("must be non-negative and finite, got {value}"),
    )
}

impl SimConfig {
    /// Parse a JSON document and validate the result.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value, including the bound that keeps any entity from
    /// moving a full tile in one clamped frame.
    pub fn validate(&self) -> Result<(), EngineError> {
        let physics = &self.physics;
        non_negative(physics.gravity, "physics.gravity")?;
        positive(physics.max_fall_speed, "physics.max_fall_speed")?;
        positive(physics.max_dt, "physics.max_dt")?;

        positive(self.player.run_speed, "player.run_speed")?;
        positive(self.player.jump_speed, "player.jump_speed")?;
        non_negative(self.player.fall_threshold, "player.fall_threshold")?;

        positive(self.enemy.patrol_speed, "enemy.patrol_speed")?;
        positive(self.enemy.charge_speed, "enemy.charge_speed")?;
        positive(self.enemy.seek_widths, "enemy.seek_widths")?;
        non_negative(self.enemy.row_tolerance, "enemy.row_tolerance")?;

        let camera = &self.camera;
        positive(camera.view_width, "camera.view_width")?;
        positive(camera.view_height, "camera.view_height")?;
        non_negative(camera.focus_bound, "camera.focus_bound")?;
        non_negative(camera.edge_margin, "camera.edge_margin")?;
        require(
            camera.edge_margin * 2.0 < camera.view_width,
            "camera.edge_margin",
            format!(
                "must leave room inside a {} tile viewport, got {}",
                camera.view_width, camera.edge_margin
            ),
        )?;

        let fastest = [
            physics.max_fall_speed,
            self.player.run_speed,
            self.player.jump_speed,
            self.enemy.patrol_speed,
            self.enemy.charge_speed,
        ]
        .into_iter()
        .fold(0.0f32, f32::max);
        require(
            fastest * physics.max_dt < 1.0,
            "physics.max_dt",
            format!(
                "{} s lets a {fastest} tiles/s entity cross a whole tile in one frame",
                physics.max_dt
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(SimConfig::from_json_str("{}").unwrap(), SimConfig::default());
    }

    #[test]
    fn partial_section_keeps_other_fields() {
        let config = SimConfig::from_json_str(r#"{"camera": {"view_width": 10.0}}"#).unwrap();
        assert_eq!(config.camera.view_width, 10.0);
        assert_eq!(config.camera.view_height, 6.0);
        assert_eq!(config.physics, PhysicsConfig::default());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = SimConfig::from_json_str("{ physics: ").unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_)));
    }

    #[test]
    fn tunneling_dt_is_rejected() {
        let mut config = SimConfig::default();
        config.physics.max_dt = 0.5;
        match config.validate() {
            Err(EngineError::InvalidConfig { field, .. }) => assert_eq!(field, "physics.max_dt"),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut config = SimConfig::default();
        config.player.run_speed = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.physics.gravity = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn edge_margin_must_fit_viewport() {
        let mut config = SimConfig::default();
        config.camera.edge_margin = 4.0;
        assert!(config.validate().is_err());
    }
}
