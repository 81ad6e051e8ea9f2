use crate::api::ApiClient;
use crate::config::ViewerConfig;
use crate::console_log;
use crate::environment::SceneEnvironment;
use crate::error::Result;
use crate::geometry::{GeometryRecord, Station};
use crate::models::DxfBatch;
use crate::navigation::NavigationState;
use crate::projection::LocalFrame;
use crate::projector::{ProjectedScene, SceneProjector};

/// One viewer instance: the station, everything placed around it and the
/// walker's movement state.
#[derive(Debug, Clone)]
pub struct ViewerSession {
    config: ViewerConfig,
    station: Station,
    frame: LocalFrame,
    environment: SceneEnvironment,
    scene: ProjectedScene,
    navigation: NavigationState,
}

impl ViewerSession {
    fn with_scene(config: ViewerConfig, station: Station, scene: ProjectedScene) -> Self {
        let frame = LocalFrame::new(&station, &config);
        let environment = SceneEnvironment::new(&station, &frame, &config);
        let navigation = NavigationState::new(config.navigation.clone(), frame.camera_height());
        Self {
            config,
            station,
            frame,
            environment,
            scene,
            navigation,
        }
    }

    /// Build from records that are already decoded.
    pub fn build(config: ViewerConfig, station: Station, records: &[GeometryRecord]) -> Result<Self> {
        config.validate()?;
        let projector = SceneProjector::new(LocalFrame::new(&station, &config));
        let scene = projector.project_all(records);
        Ok(Self::with_scene(config, station, scene))
    }

    /// Build from the raw geometry list of the API.
    pub fn from_dxf(config: ViewerConfig, station: Station, batch: &DxfBatch) -> Result<Self> {
        config.validate()?;
        let projector = SceneProjector::new(LocalFrame::new(&station, &config));
        let scene = projector.project_dxf(batch)?;
        Ok(Self::with_scene(config, station, scene))
    }

    /// Fetch the station, then its geometry, then build. Either fetch
    /// failing aborts the whole build.
    pub async fn load(config: ViewerConfig, station_id: u32) -> Result<Self> {
        config.validate()?;
        let api = ApiClient::new(config.api_base());
        let station = api.fetch_station(station_id).await?;
        let batch = api.fetch_geometries(station_id).await?;
        console_log!(
            "Building scene for station {} at {}, {}",
            station_id,
            station.position.lat,
            station.position.long
        );
        Self::from_dxf(config, station, &batch)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    pub fn frame(&self) -> &LocalFrame {
        &self.frame
    }

    pub fn environment(&self) -> &SceneEnvironment {
        &self.environment
    }

    pub fn scene(&self) -> &ProjectedScene {
        &self.scene
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationState {
        &mut self.navigation
    }
}
