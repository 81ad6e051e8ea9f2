use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

// Earth radius as calibrated for the survey data, not the 6371 km mean radius
pub const EARTH_RADIUS_METERS: f64 = 6315.0 * 1000.0;
// Standing eye height in meters
pub const EYE_HEIGHT: f64 = 1.6;
// Meters to engine units
pub const WORLD_SCALE: f64 = 6.25;

pub const DEFAULT_API_BASE: &str = "/build-api";

// Camera frustum
pub const CAMERA_FOV: f64 = 75.0;
pub const CAMERA_NEAR: f64 = 1.0;
pub const CAMERA_FAR: f64 = 1000.0;

// First person movement, engine units and seconds
pub const VELOCITY_DAMPING: f64 = 10.0;
pub const GRAVITY: f64 = 9.8 * 100.0;
pub const MOVE_ACCELERATION: f64 = 400.0;
pub const JUMP_IMPULSE: f64 = 350.0;
pub const MIN_HEIGHT: f64 = 10.0;

/// Viewer tuning. Every field is optional on the JS side and falls back to
/// the constants above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_world_scale")]
    pub world_scale: f64,
    #[serde(default = "default_eye_height")]
    pub eye_height: f64,
    #[serde(default = "default_earth_radius")]
    pub earth_radius_m: f64,
    #[serde(default = "default_fov")]
    pub fov: f64,
    #[serde(default = "default_near")]
    pub near: f64,
    #[serde(default = "default_far")]
    pub far: f64,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationConfig {
    #[serde(default = "default_damping")]
    pub damping: f64,
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    #[serde(default = "default_move_acceleration")]
    pub move_acceleration: f64,
    #[serde(default = "default_jump_impulse")]
    pub jump_impulse: f64,
    #[serde(default = "default_min_height")]
    pub min_height: f64,
}

// Default values for JSON options
fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_world_scale() -> f64 {
    WORLD_SCALE
}
fn default_eye_height() -> f64 {
    EYE_HEIGHT
}
fn default_earth_radius() -> f64 {
    EARTH_RADIUS_METERS
}
fn default_fov() -> f64 {
    CAMERA_FOV
}
fn default_near() -> f64 {
    CAMERA_NEAR
}
fn default_far() -> f64 {
    CAMERA_FAR
}
fn default_damping() -> f64 {
    VELOCITY_DAMPING
}
fn default_gravity() -> f64 {
    GRAVITY
}
fn default_move_acceleration() -> f64 {
    MOVE_ACCELERATION
}
fn default_jump_impulse() -> f64 {
    JUMP_IMPULSE
}
fn default_min_height() -> f64 {
    MIN_HEIGHT
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            world_scale: WORLD_SCALE,
            eye_height: EYE_HEIGHT,
            earth_radius_m: EARTH_RADIUS_METERS,
            fov: CAMERA_FOV,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            navigation: NavigationConfig::default(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            damping: VELOCITY_DAMPING,
            gravity: GRAVITY,
            move_acceleration: MOVE_ACCELERATION,
            jump_impulse: JUMP_IMPULSE,
            min_height: MIN_HEIGHT,
        }
    }
}

impl ViewerConfig {
    /// Parse a JSON config, an empty string meaning "all defaults".
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ViewerConfig =
            serde_json::from_str(json).map_err(|e| ViewerError::decode("viewer config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("worldScale", self.world_scale),
            ("earthRadiusM", self.earth_radius_m),
            ("fov", self.fov),
            ("near", self.near),
            ("far", self.far),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ViewerError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.near >= self.far {
            return Err(ViewerError::Config(format!(
                "near plane {} must be closer than far plane {}",
                self.near, self.far
            )));
        }
        if !self.eye_height.is_finite() {
            return Err(ViewerError::Config("eyeHeight must be finite".to_string()));
        }
        let nav = &self.navigation;
        for (name, value) in [
            ("navigation.damping", nav.damping),
            ("navigation.gravity", nav.gravity),
            ("navigation.moveAcceleration", nav.move_acceleration),
            ("navigation.jumpImpulse", nav.jump_impulse),
            ("navigation.minHeight", nav.min_height),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ViewerError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config = ViewerConfig::from_json("  ").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.world_scale, 6.25);
        assert_eq!(config.earth_radius_m, 6_315_000.0);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config =
            ViewerConfig::from_json(r#"{"apiBase": "/api/", "navigation": {"minHeight": 4}}"#)
                .unwrap();
        assert_eq!(config.api_base(), "/api");
        assert_eq!(config.navigation.min_height, 4.0);
        assert_eq!(config.navigation.gravity, GRAVITY);
        assert_eq!(config.eye_height, EYE_HEIGHT);
    }

    #[test]
    fn rejects_non_positive_scale() {
        let err = ViewerConfig::from_json(r#"{"worldScale": 0}"#).unwrap_err();
        assert!(matches!(err, ViewerError::Config(_)));
    }

    #[test]
    fn rejects_inverted_frustum() {
        let err = ViewerConfig::from_json(r#"{"near": 10, "far": 5}"#).unwrap_err();
        assert!(err.to_string().contains("near plane"));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = ViewerConfig::from_json("{worldScale:").unwrap_err();
        assert!(matches!(err, ViewerError::Decode { .. }));
    }
}
