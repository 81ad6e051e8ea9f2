// Scene set-up around the projected geometry: camera, fog, lights and floor
use serde::Serialize;

use crate::config::ViewerConfig;
use crate::geometry::Station;
use crate::projection::LocalFrame;

const BACKGROUND: &str = "#ffffff";
const FOG_NEAR: f64 = 0.0;
const FOG_FAR: f64 = 750.0;
const FLOOR_SIZE: f64 = 2000.0;
const FLOOR_COLOR: &str = "#cccccc";
// Sink the floor slightly below the surveyed level to avoid z-fighting
const FLOOR_SUBMERGE_OFFSET: f64 = 0.01;
const SHADOW_EXTENT: f64 = 100.0;
const SHADOW_MAP_SIZE: u32 = 512 * 4;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CameraSetup {
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    pub height: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FogSetup {
    pub color: String,
    pub near: f64,
    pub far: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HemisphereLightSetup {
    pub sky_color: String,
    pub ground_color: String,
    pub intensity: f64,
    pub position: [f64; 3],
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShadowSetup {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub near: f64,
    pub far: f64,
    pub map_size: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalLightSetup {
    pub color: String,
    pub intensity: f64,
    pub position: [f64; 3],
    pub target: [f64; 3],
    pub shadow: ShadowSetup,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FloorSetup {
    pub size: f64,
    pub height: f64,
    pub color: String,
    pub double_sided: bool,
    pub receive_shadow: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneEnvironment {
    pub background: String,
    pub camera: CameraSetup,
    pub fog: FogSetup,
    pub hemisphere_light: HemisphereLightSetup,
    pub directional_light: DirectionalLightSetup,
    pub floor: FloorSetup,
}

impl SceneEnvironment {
    pub fn new(station: &Station, frame: &LocalFrame, config: &ViewerConfig) -> Self {
        let elev = frame.elevation_offset();
        SceneEnvironment {
            background: BACKGROUND.to_string(),
            camera: CameraSetup {
                fov: config.fov,
                near: config.near,
                far: config.far,
                height: frame.camera_height(),
            },
            fog: FogSetup {
                color: BACKGROUND.to_string(),
                near: FOG_NEAR,
                far: FOG_FAR,
            },
            hemisphere_light: HemisphereLightSetup {
                sky_color: "#eeeeff".to_string(),
                ground_color: "#777788".to_string(),
                intensity: 0.75,
                position: [0.5, 1.0 - elev, 0.75],
            },
            directional_light: DirectionalLightSetup {
                color: "#ffffff".to_string(),
                intensity: 0.5,
                position: [-50.0, 100.0 - elev, 50.0],
                target: [0.0, -elev, 0.0],
                shadow: ShadowSetup {
                    left: -SHADOW_EXTENT,
                    right: SHADOW_EXTENT,
                    bottom: -SHADOW_EXTENT,
                    top: SHADOW_EXTENT,
                    near: 0.5,
                    far: 500.0,
                    map_size: SHADOW_MAP_SIZE,
                },
            },
            // Floor level is not multiplied by the world scale
            floor: FloorSetup {
                size: FLOOR_SIZE,
                height: station.floor - FLOOR_SUBMERGE_OFFSET - elev,
                color: FLOOR_COLOR.to_string(),
                double_sided: true,
                receive_shadow: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoPoint;

    #[test]
    fn lights_and_floor_follow_elevation_offset() {
        let config = ViewerConfig::default();
        let station = Station::new(GeoPoint::new(45.0, 9.0), 4.8, 3.2);
        let frame = LocalFrame::new(&station, &config);
        let env = SceneEnvironment::new(&station, &frame, &config);

        // (4.8 - 1.6) * 6.25
        let elev = 20.0;
        assert!((env.hemisphere_light.position[1] - (1.0 - elev)).abs() < 1e-9);
        assert!((env.directional_light.target[1] + elev).abs() < 1e-9);
        assert!((env.floor.height - (3.2 - 0.01 - elev)).abs() < 1e-9);
        assert!((env.camera.height - 10.0).abs() < 1e-9);
        assert_eq!(env.camera.fov, 75.0);
        assert_eq!(env.directional_light.shadow.map_size, 2048);
    }
}
