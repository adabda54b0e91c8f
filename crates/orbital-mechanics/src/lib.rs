//! Orbital Mechanics Library
//!
//! SGP4 orchestration for the debris reentry viewer: TLE epoch resolution,
//! propagation, ECI to geodetic/scene transforms, antimeridian-aware ground
//! tracks, 3D orbit paths and live constellation sampling.
//!
//! Propagation itself is delegated to the `sgp4` crate. Everything here is
//! the plumbing around it: which instants to sample, what to do when a sample
//! fails, and how to project the result for a map or a globe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod constellation;
pub mod epoch;
pub mod ground_track;
pub mod orbit_path;
pub mod propagation;
pub mod sampling;
pub mod transforms;

pub use constellation::{LiveConfig, LiveFrame, LiveObject, LivePosition, LiveSession, ObjectClass, SimulationClock};
pub use epoch::resolve_epoch;
pub use ground_track::{build_ground_track, segment_track, GeoBounds, GroundTrack, TrackSegment, ViewFit};
pub use orbit_path::{build_orbit_path, OrbitPath};
pub use propagation::{position_at, EciState, Propagator, SatelliteRecord};
pub use sampling::{SamplingConfig, SamplingWindow};
pub use transforms::{eci_to_geodetic, eci_to_scene, gmst, normalize_longitude, ScenePoint};

/// Mean Earth radius used to scale altitudes for globe rendering (km)
pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitalError {
    #[error("No orbital element set available")]
    MissingElementSet,
    #[error("Invalid TLE format: {0}")]
    InvalidTle(String),
    #[error("Invalid epoch: year={year}, day={day}")]
    InvalidEpoch { year: f64, day: f64 },
    #[error("Invalid mean motion: {0} rev/day")]
    InvalidMeanMotion(f64),
    #[error("Propagation failed: {0}")]
    PropagationFailed(String),
    #[error("Geodetic singularity: lat={latitude}, lon={longitude}")]
    GeodeticSingularity { latitude: f64, longitude: f64 },
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// Geodetic position in degrees, longitude normalized to (-180, 180]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
}

impl GeodeticPoint {
    pub fn new(latitude: f64, longitude: f64, altitude_km: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_km,
        }
    }
}
