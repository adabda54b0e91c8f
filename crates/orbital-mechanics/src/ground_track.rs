//! Ground tracks split at the antimeridian
//!
//! Consecutive accepted points whose longitudes differ by more than the wrap
//! threshold start a new segment, so a map polyline never draws a line
//! across the full map width. Segments with fewer than two points are
//! dropped.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::propagation::{position_at, Propagator};
use crate::sampling::{SamplingConfig, SamplingWindow};
use crate::{GeodeticPoint, OrbitalError};

/// Zoom level used when a view is centered on a reference point
pub const FALLBACK_ZOOM: u8 = 3;

/// Contiguous run of points that never crosses the antimeridian
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSegment {
    pub points: Vec<GeodeticPoint>,
}

impl TrackSegment {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Incremental segmenter: push points in time order, then `finish`
#[derive(Debug, Clone)]
pub struct TrackSegmenter {
    threshold_deg: f64,
    current: Vec<GeodeticPoint>,
    previous_lon: Option<f64>,
    segments: Vec<TrackSegment>,
}

impl TrackSegmenter {
    pub fn new(threshold_deg: f64) -> Self {
        Self {
            threshold_deg,
            current: Vec::new(),
            previous_lon: None,
            segments: Vec::new(),
        }
    }

    pub fn push(&mut self, point: GeodeticPoint) {
        if let Some(previous) = self.previous_lon {
            if (point.longitude - previous).abs() > self.threshold_deg {
                self.close_current();
            }
        }
        self.current.push(point);
        self.previous_lon = Some(point.longitude);
    }

    pub fn finish(mut self) -> Vec<TrackSegment> {
        self.close_current();
        self.segments
    }

    fn close_current(&mut self) {
        let points = std::mem::take(&mut self.current);
        if points.len() >= 2 {
            self.segments.push(TrackSegment { points });
        }
    }
}

/// Split an ordered point sequence into antimeridian-safe segments
pub fn segment_track<I>(points: I, threshold_deg: f64) -> Vec<TrackSegment>
where
    I: IntoIterator<Item = GeodeticPoint>,
{
    let mut segmenter = TrackSegmenter::new(threshold_deg);
    for point in points {
        segmenter.push(point);
    }
    segmenter.finish()
}

/// Latitude/longitude box, degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a GeodeticPoint>,
    {
        points.into_iter().fold(None, |bounds, p| {
            Some(match bounds {
                None => GeoBounds {
                    south: p.latitude,
                    west: p.longitude,
                    north: p.latitude,
                    east: p.longitude,
                },
                Some(b) => GeoBounds {
                    south: b.south.min(p.latitude),
                    west: b.west.min(p.longitude),
                    north: b.north.max(p.latitude),
                    east: b.east.max(p.longitude),
                },
            })
        })
    }
}

/// How a map should frame a ground track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewFit {
    Bounds(GeoBounds),
    Center { latitude: f64, longitude: f64, zoom: u8 },
    NoData,
}

/// Segmented ground track for one object over one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTrack {
    pub segments: Vec<TrackSegment>,
    pub window: Option<SamplingWindow>,
    pub samples_attempted: usize,
    pub samples_skipped: usize,
    /// Set when the window itself could not be built (bad epoch or period)
    #[serde(skip)]
    pub unavailable: Option<OrbitalError>,
}

impl GroundTrack {
    fn unavailable(reason: OrbitalError) -> Self {
        Self {
            segments: Vec::new(),
            window: None,
            samples_attempted: 0,
            samples_skipped: 0,
            unavailable: Some(reason),
        }
    }

    /// No segment to draw: render as "no track available"
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.segments.iter().map(TrackSegment::len).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = &GeodeticPoint> {
        self.segments.iter().flat_map(|s| s.points.iter())
    }

    /// Frame the whole track, falling back to a reference point (usually the
    /// reentry site) when there is nothing to draw.
    pub fn view_fit(&self, reference: Option<(f64, f64)>) -> ViewFit {
        let first_drawable = self.segments.first().map_or(false, |s| s.len() > 1);
        if first_drawable {
            if let Some(bounds) = GeoBounds::from_points(self.points()) {
                return ViewFit::Bounds(bounds);
            }
        }
        match reference {
            Some((latitude, longitude)) => ViewFit::Center {
                latitude,
                longitude,
                zoom: FALLBACK_ZOOM,
            },
            None => ViewFit::NoData,
        }
    }
}

/// Sample `config.revolutions` periods from the epoch and segment the track.
///
/// Failed samples (propagation errors, geodetic singularities) are skipped.
/// If the window cannot be built the result is an empty track with
/// `unavailable` set.
pub fn build_ground_track<P: Propagator + ?Sized>(propagator: &P, config: &SamplingConfig) -> GroundTrack {
    let window = match SamplingWindow::for_propagator(propagator, config) {
        Ok(window) => window,
        Err(e) => {
            warn!("Ground track unavailable: {}", e);
            return GroundTrack::unavailable(e);
        }
    };

    let mut segmenter = TrackSegmenter::new(config.wrap_threshold_deg);
    let mut attempted = 0;
    let mut skipped = 0;

    for time in window.times() {
        attempted += 1;
        match position_at(propagator, time) {
            Ok(point) => segmenter.push(point),
            Err(e) => {
                skipped += 1;
                trace!("Skipping ground track sample at {}: {}", time, e);
            }
        }
    }

    let segments = segmenter.finish();
    debug!(
        "Ground track: {} segments, {}/{} samples skipped",
        segments.len(),
        skipped,
        attempted
    );

    GroundTrack {
        segments,
        window: Some(window),
        samples_attempted: attempted,
        samples_skipped: skipped,
        unavailable: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::tests::{FailingPropagator, ISS_LINE1, ISS_LINE2, NINETY_MIN_LINE2};
    use crate::propagation::{EciState, SatelliteRecord};
    use crate::Result;
    use chrono::{DateTime, Utc};

    fn pt(lon: f64) -> GeodeticPoint {
        GeodeticPoint::new(0.0, lon, 400.0)
    }

    #[test]
    fn test_jump_of_31_degrees_splits() {
        let segments = segment_track(vec![pt(0.0), pt(1.0), pt(32.0), pt(33.0)], 30.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].points, vec![pt(0.0), pt(1.0)]);
        assert_eq!(segments[1].points, vec![pt(32.0), pt(33.0)]);
    }

    #[test]
    fn test_jump_of_29_degrees_does_not_split() {
        let segments = segment_track(vec![pt(0.0), pt(1.0), pt(30.0), pt(31.0)], 30.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 4);
    }

    #[test]
    fn test_exact_threshold_does_not_split() {
        let segments = segment_track(vec![pt(0.0), pt(30.0)], 30.0);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_single_point_segments_dropped() {
        // 170 alone between two wraps
        let segments = segment_track(
            vec![pt(-10.0), pt(-9.0), pt(170.0), pt(-170.0), pt(-169.0)],
            30.0,
        );
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.len() >= 2));
        assert_eq!(segments[1].points[0], pt(-170.0));
    }

    #[test]
    fn test_trailing_single_point_dropped() {
        let segments = segment_track(vec![pt(0.0), pt(1.0), pt(100.0)], 30.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 2);
    }

    #[test]
    fn test_empty_and_singleton_inputs() {
        assert!(segment_track(Vec::new(), 30.0).is_empty());
        assert!(segment_track(vec![pt(5.0)], 30.0).is_empty());
    }

    #[test]
    fn test_antimeridian_wrap_splits() {
        let segments = segment_track(vec![pt(178.0), pt(179.5), pt(-179.0), pt(-177.5)], 30.0);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_failing_propagator_yields_no_segments() {
        let failing = FailingPropagator {
            period: 90.0,
            epoch: Utc::now(),
        };
        let track = build_ground_track(&failing, &SamplingConfig::default());
        assert!(track.is_empty());
        assert_eq!(track.samples_attempted, 361);
        assert_eq!(track.samples_skipped, 361);
        assert!(track.unavailable.is_none());
        assert_eq!(track.view_fit(None), ViewFit::NoData);
    }

    struct BadEpoch;

    impl Propagator for BadEpoch {
        fn propagate(&self, _time: DateTime<Utc>) -> Result<EciState> {
            unreachable!("window is never built")
        }

        fn period_minutes(&self) -> Result<f64> {
            Ok(90.0)
        }

        fn epoch(&self) -> Result<DateTime<Utc>> {
            Err(OrbitalError::InvalidEpoch {
                year: f64::NAN,
                day: 1.0,
            })
        }
    }

    #[test]
    fn test_invalid_epoch_gives_empty_track() {
        let track = build_ground_track(&BadEpoch, &SamplingConfig::default());
        assert!(track.is_empty());
        assert_eq!(track.samples_attempted, 0);
        assert!(matches!(track.unavailable, Some(OrbitalError::InvalidEpoch { .. })));
    }

    #[test]
    fn test_iss_track_is_segmented_and_normalized() {
        let record = SatelliteRecord::from_tle(ISS_LINE1, ISS_LINE2).unwrap();
        let track = build_ground_track(&record, &SamplingConfig::default());

        // ~4 revolutions of a ~93 minute orbit
        assert!(track.samples_attempted > 370 && track.samples_attempted < 375);
        assert_eq!(track.samples_skipped, 0);
        // The Earth turns under four orbits, so the track must wrap at least once
        assert!(track.segments.len() >= 2, "{} segments", track.segments.len());

        for segment in &track.segments {
            assert!(segment.len() >= 2);
            for pair in segment.points.windows(2) {
                assert!((pair[1].longitude - pair[0].longitude).abs() <= 30.0);
            }
        }
        for p in track.points() {
            assert!(p.longitude > -180.0 && p.longitude <= 180.0);
            assert!(p.latitude.abs() <= 52.0);
        }
        // Only lone points stranded between wraps may be lost
        let kept = track.point_count();
        assert!(kept <= track.samples_attempted);
        assert!(kept + track.segments.len() >= track.samples_attempted);
    }

    #[test]
    fn test_ninety_minute_track_sample_count() {
        let record = SatelliteRecord::from_tle(ISS_LINE1, NINETY_MIN_LINE2).unwrap();
        let track = build_ground_track(&record, &SamplingConfig::default());
        assert_eq!(track.samples_attempted, 361);
    }

    #[test]
    fn test_view_fit_bounds_and_fallback() {
        let track = GroundTrack {
            segments: segment_track(
                vec![
                    GeodeticPoint::new(10.0, 20.0, 400.0),
                    GeodeticPoint::new(-5.0, 25.0, 400.0),
                    GeodeticPoint::new(3.0, 28.0, 400.0),
                ],
                30.0,
            ),
            window: None,
            samples_attempted: 3,
            samples_skipped: 0,
            unavailable: None,
        };
        assert_eq!(
            track.view_fit(Some((1.0, 2.0))),
            ViewFit::Bounds(GeoBounds {
                south: -5.0,
                west: 20.0,
                north: 10.0,
                east: 28.0
            })
        );

        let empty = GroundTrack {
            segments: Vec::new(),
            ..track
        };
        assert_eq!(
            empty.view_fit(Some((1.0, 2.0))),
            ViewFit::Center {
                latitude: 1.0,
                longitude: 2.0,
                zoom: FALLBACK_ZOOM
            }
        );
    }
}
