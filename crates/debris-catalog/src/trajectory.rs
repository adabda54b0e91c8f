//! Per-object trajectory assembly

use orbital_mechanics::{
    build_ground_track, build_orbit_path, GroundTrack, ObjectClass, OrbitPath, SamplingConfig, ViewFit,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{DebrisRecord, ReentrySite, Result};

/// Gap between the reentry and the last element set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TleAge {
    pub days: f64,
    pub hours: f64,
}

impl TleAge {
    pub fn from_days(days: f64) -> Option<Self> {
        days.is_finite().then(|| Self { days, hours: days * 24.0 })
    }

    pub fn notice(&self) -> String {
        format!(
            "Estimated time between reentry and the last orbital data (TLE): {:.2} hours",
            self.hours
        )
    }
}

/// Everything a map or globe needs to show one object's orbit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    pub name: String,
    pub norad_id: Option<u64>,
    pub class: ObjectClass,
    pub ground_track: GroundTrack,
    pub orbit_path: OrbitPath,
    pub view_fit: ViewFit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reentry_site: Option<ReentrySite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tle_age: Option<TleAge>,
}

impl Trajectory {
    /// True when neither a track nor a path could be produced
    pub fn is_empty(&self) -> bool {
        self.ground_track.is_empty() && self.orbit_path.is_empty()
    }
}

/// Build the ground track and orbit path of one catalog object.
///
/// Fails only when the record has no usable TLE pair. An unusable epoch or
/// a propagator that fails on every sample yields an empty trajectory.
pub fn build_trajectory(record: &DebrisRecord, config: &SamplingConfig) -> Result<Trajectory> {
    let satellite = record.satellite_record()?;
    let name = record.display_name();

    let ground_track = build_ground_track(&satellite, config);
    let orbit_path = build_orbit_path(&satellite, config);
    let reentry = record.reentry_point();
    let view_fit = ground_track.view_fit(reentry);

    debug!(
        "{}: {} segments, {} track points, {} path points",
        name,
        ground_track.segments.len(),
        ground_track.point_count(),
        orbit_path.points.len()
    );
    if ground_track.is_empty() {
        info!("{}: no ground track available", name);
    }

    Ok(Trajectory {
        name,
        norad_id: record.norad_id.or(Some(satellite.norad_id())),
        class: record.object_class(),
        ground_track,
        orbit_path,
        view_fit,
        reentry_site: record.reentry_site.filter(ReentrySite::is_valid),
        tle_age: record.days_difference.and_then(TleAge::from_days),
    })
}
