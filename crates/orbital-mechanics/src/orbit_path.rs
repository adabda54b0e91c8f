//! 3D orbit paths
//!
//! Same window as the ground track, but points stay in inertial space and
//! are emitted as one continuous polyline: nothing wraps in 3D.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::propagation::Propagator;
use crate::sampling::{SamplingConfig, SamplingWindow};
use crate::transforms::{eci_to_scene, ScenePoint};
use crate::OrbitalError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitPath {
    pub points: Vec<ScenePoint>,
    pub window: Option<SamplingWindow>,
    pub samples_attempted: usize,
    pub samples_skipped: usize,
    #[serde(skip)]
    pub unavailable: Option<OrbitalError>,
}

impl OrbitPath {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A line needs at least two vertices
    pub fn is_drawable(&self) -> bool {
        self.points.len() > 1
    }
}

/// Sample the window and collect scene-space points in time order.
/// Failed samples shorten the path; they never abort it.
pub fn build_orbit_path<P: Propagator + ?Sized>(propagator: &P, config: &SamplingConfig) -> OrbitPath {
    let window = match SamplingWindow::for_propagator(propagator, config) {
        Ok(window) => window,
        Err(e) => {
            warn!("Orbit path unavailable: {}", e);
            return OrbitPath {
                points: Vec::new(),
                window: None,
                samples_attempted: 0,
                samples_skipped: 0,
                unavailable: Some(e),
            };
        }
    };

    let mut attempted = 0;
    let points: Vec<ScenePoint> = window
        .times()
        .inspect(|_| attempted += 1)
        .filter_map(|time| match propagator.propagate(time) {
            Ok(state) => Some(eci_to_scene(state.position)),
            Err(e) => {
                trace!("Skipping orbit path sample at {}: {}", time, e);
                None
            }
        })
        .collect();

    let skipped = attempted - points.len();
    debug!("Orbit path: {} points, {}/{} samples skipped", points.len(), skipped, attempted);

    OrbitPath {
        points,
        window: Some(window),
        samples_attempted: attempted,
        samples_skipped: skipped,
        unavailable: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::tests::{FailingPropagator, ISS_LINE1, NINETY_MIN_LINE2};
    use crate::propagation::{EciState, SatelliteRecord};
    use crate::Result;
    use chrono::{DateTime, Duration, Utc};

    /// Fails on every third sample, otherwise returns a position encoding
    /// the minute offset
    struct Flaky {
        epoch: DateTime<Utc>,
    }

    impl Propagator for Flaky {
        fn propagate(&self, time: DateTime<Utc>) -> Result<EciState> {
            let minute = (time - self.epoch).num_minutes() as f64;
            if minute as i64 % 3 == 2 {
                return Err(OrbitalError::PropagationFailed("flaky".into()));
            }
            Ok(EciState {
                position: [minute, 1.0, 2.0],
                velocity: [0.0; 3],
                time,
            })
        }

        fn period_minutes(&self) -> Result<f64> {
            Ok(3.0)
        }

        fn epoch(&self) -> Result<DateTime<Utc>> {
            Ok(self.epoch)
        }
    }

    #[test]
    fn test_failed_samples_shorten_path() {
        let flaky = Flaky { epoch: Utc::now() };
        let path = build_orbit_path(&flaky, &SamplingConfig::default());

        // 12 minute window -> 13 samples, minutes 2,5,8,11 fail
        assert_eq!(path.samples_attempted, 13);
        assert_eq!(path.samples_skipped, 4);
        let xs: Vec<f64> = path.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 3.0, 4.0, 6.0, 7.0, 9.0, 10.0, 12.0]);
        assert!(path.points.iter().all(|p| p.y == 2.0 && p.z == -1.0));
    }

    #[test]
    fn test_failing_propagator_yields_empty_path() {
        let failing = FailingPropagator {
            period: 90.0,
            epoch: Utc::now(),
        };
        let path = build_orbit_path(&failing, &SamplingConfig::default());
        assert!(path.is_empty());
        assert!(!path.is_drawable());
        assert_eq!(path.samples_attempted, 361);
    }

    #[test]
    fn test_real_orbit_path_matches_propagator() {
        let record = SatelliteRecord::from_tle(ISS_LINE1, NINETY_MIN_LINE2).unwrap();
        let path = build_orbit_path(&record, &SamplingConfig::default());

        assert_eq!(path.samples_attempted, 361);
        assert_eq!(path.points.len(), 361);
        assert!(path.is_drawable());

        let epoch = record.epoch().unwrap();
        let state = record.propagate(epoch + Duration::minutes(10)).unwrap();
        assert_eq!(path.points[10], eci_to_scene(state.position));
    }
}
