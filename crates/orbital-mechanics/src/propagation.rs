//! SGP4 propagation adapter
//!
//! [`SatelliteRecord`] wraps the parsed `sgp4` elements and constants for one
//! TLE pair. It is built once and only read afterwards, so propagation is a
//! pure function of (record, time).

use chrono::{DateTime, Utc};
use std::f64::consts::PI;
use std::fmt;

use crate::epoch::{epoch_fields, resolve_epoch};
use crate::transforms::{eci_to_geodetic, gmst};
use crate::{GeodeticPoint, OrbitalError, Result};

const MINUTES_PER_DAY: f64 = 1440.0;

/// ECI (TEME) state at one instant: km and km/s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EciState {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub time: DateTime<Utc>,
}

/// Anything that can place an object in ECI at a given time.
///
/// Implementations must not carry mutable state between calls: the same
/// time must always yield the same state.
pub trait Propagator {
    fn propagate(&self, time: DateTime<Utc>) -> Result<EciState>;

    /// Orbital period in minutes
    fn period_minutes(&self) -> Result<f64>;

    /// Reference instant of the element set
    fn epoch(&self) -> Result<DateTime<Utc>>;
}

/// Parsed TLE ready for propagation
pub struct SatelliteRecord {
    norad_id: u64,
    elements: sgp4::Elements,
    constants: sgp4::Constants,
    epoch_year: f64,
    epoch_day: f64,
    epoch: Result<DateTime<Utc>>,
}

impl SatelliteRecord {
    /// Parse a TLE line pair. Lines are trimmed before parsing; a blank line
    /// means there is no element set at all.
    pub fn from_tle(line1: &str, line2: &str) -> Result<Self> {
        let line1 = line1.trim();
        let line2 = line2.trim();
        if line1.is_empty() || line2.is_empty() {
            return Err(OrbitalError::MissingElementSet);
        }

        let elements = sgp4::Elements::from_tle(None, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| OrbitalError::InvalidTle(format!("{:?}", e)))?;

        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| OrbitalError::InvalidTle(format!("{:?}", e)))?;

        let (epoch_year, epoch_day) = epoch_fields(line1);
        let epoch = resolve_epoch(epoch_year, epoch_day);

        Ok(Self {
            norad_id: elements.norad_id,
            elements,
            constants,
            epoch_year,
            epoch_day,
            epoch,
        })
    }

    pub fn norad_id(&self) -> u64 {
        self.norad_id
    }

    /// Raw two-digit epoch year as found in the TLE
    pub fn epoch_year(&self) -> f64 {
        self.epoch_year
    }

    /// Raw fractional day of year as found in the TLE
    pub fn epoch_day(&self) -> f64 {
        self.epoch_day
    }

    pub fn mean_motion_rev_per_day(&self) -> f64 {
        self.elements.mean_motion
    }

    /// Mean motion in radians per minute (`no`)
    pub fn mean_motion_rad_per_min(&self) -> f64 {
        self.elements.mean_motion * 2.0 * PI / MINUTES_PER_DAY
    }

    pub fn inclination_deg(&self) -> f64 {
        self.elements.inclination
    }

    fn minutes_since_epoch(&self, time: DateTime<Utc>) -> f64 {
        let element_epoch = self.elements.datetime.and_utc();
        time.signed_duration_since(element_epoch).num_milliseconds() as f64 / 60_000.0
    }
}

impl Propagator for SatelliteRecord {
    fn propagate(&self, time: DateTime<Utc>) -> Result<EciState> {
        let minutes = self.minutes_since_epoch(time);

        let prediction = self
            .constants
            .propagate(sgp4::MinutesSinceEpoch(minutes))
            .map_err(|e| OrbitalError::PropagationFailed(format!("{:?}", e)))?;

        let state = EciState {
            position: prediction.position,
            velocity: prediction.velocity,
            time,
        };
        if state.position.iter().any(|c| !c.is_finite()) {
            return Err(OrbitalError::PropagationFailed(format!(
                "non-finite position at t+{:.1} min",
                minutes
            )));
        }

        Ok(state)
    }

    fn period_minutes(&self) -> Result<f64> {
        period_from_mean_motion(self.mean_motion_rev_per_day())
    }

    fn epoch(&self) -> Result<DateTime<Utc>> {
        self.epoch.clone()
    }
}

impl fmt::Debug for SatelliteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SatelliteRecord")
            .field("norad_id", &self.norad_id)
            .field("epoch_year", &self.epoch_year)
            .field("epoch_day", &self.epoch_day)
            .field("mean_motion", &self.elements.mean_motion)
            .finish()
    }
}

/// Minutes per revolution from revolutions per day
pub fn period_from_mean_motion(rev_per_day: f64) -> Result<f64> {
    if !rev_per_day.is_finite() || rev_per_day <= 0.0 {
        return Err(OrbitalError::InvalidMeanMotion(rev_per_day));
    }
    Ok(MINUTES_PER_DAY / rev_per_day)
}

/// Propagate and project to geodetic coordinates at one instant
pub fn position_at<P: Propagator + ?Sized>(propagator: &P, time: DateTime<Utc>) -> Result<GeodeticPoint> {
    let state = propagator.propagate(time)?;
    eci_to_geodetic(state.position, gmst(time))
}
