//! Flat-earth projection of geographic anchors into the station frame.
//!
//! Over the few hundred meters a building spans, a degree of latitude is
//! treated as a constant arc length and a degree of longitude as that arc
//! shrunk by the cosine of the station latitude.

use nalgebra::Vector3;
use serde::Serialize;
use std::f64::consts::PI;

use crate::config::ViewerConfig;
use crate::geometry::{GeoPoint, Station};

/// Offset in meters of the station relative to a record anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocalOffset {
    pub delta_north: f64,
    pub delta_east: f64,
}

/// Station-centred frame: north maps to -Z, east to +X, up to +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    origin: GeoPoint,
    station_elevation: f64,
    arc_constant: f64,
    latitude_correction: f64,
    elevation_offset: f64,
    world_scale: f64,
}

impl LocalFrame {
    pub fn new(station: &Station, config: &ViewerConfig) -> Self {
        let arc_constant = config.earth_radius_m * PI / 180.0;
        let latitude_correction = (station.position.lat * PI / 180.0).cos().abs();
        let elevation_offset = (station.elevation - config.eye_height) * config.world_scale;
        Self {
            origin: station.position,
            station_elevation: station.elevation,
            arc_constant,
            latitude_correction,
            elevation_offset,
            world_scale: config.world_scale,
        }
    }

    /// Meters of arc per degree of latitude.
    pub fn arc_constant(&self) -> f64 {
        self.arc_constant
    }

    pub fn world_scale(&self) -> f64 {
        self.world_scale
    }

    /// Engine-unit shift that keeps the eye at a constant rendering height
    /// whatever the station's floor elevation.
    pub fn elevation_offset(&self) -> f64 {
        self.elevation_offset
    }

    /// Initial camera height in engine units.
    pub fn camera_height(&self) -> f64 {
        self.station_elevation * self.world_scale - self.elevation_offset
    }

    pub fn offset_of(&self, anchor: &GeoPoint) -> LocalOffset {
        LocalOffset {
            delta_north: (self.origin.lat - anchor.lat) * self.arc_constant,
            delta_east: (self.origin.long - anchor.long)
                * self.arc_constant
                * self.latitude_correction,
        }
    }

    /// Engine-space translation of a record whose local origin is `anchor`.
    pub fn placement_of(&self, anchor: &GeoPoint) -> Vector3<f64> {
        let offset = self.offset_of(anchor);
        Vector3::new(
            offset.delta_east * self.world_scale,
            -self.elevation_offset,
            -offset.delta_north * self.world_scale,
        )
    }
}
