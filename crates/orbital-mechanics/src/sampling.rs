//! Sampling windows for ground tracks and orbit paths
//!
//! A window starts at the element-set epoch and spans a fixed number of
//! revolutions, sampled at a fixed step with the end point included.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::propagation::Propagator;
use crate::Result;

/// Tunable sampling parameters.
///
/// `revolutions` and `wrap_threshold_deg` are empirical display choices, not
/// values derived from the orbit. A near-polar pass can move more than 30° of
/// longitude in one step and would be split even though it is continuous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Revolutions covered by one window
    pub revolutions: f64,
    /// Minutes between samples
    pub step_minutes: f64,
    /// Longitude jump (degrees) treated as an antimeridian wrap
    pub wrap_threshold_deg: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            revolutions: 4.0,
            step_minutes: 1.0,
            wrap_threshold_deg: 30.0,
        }
    }
}

/// Fixed-step time window, inclusive of both ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingWindow {
    pub start: DateTime<Utc>,
    pub span_minutes: f64,
    pub step_minutes: f64,
}

impl SamplingWindow {
    /// Window of `config.revolutions` periods starting at the epoch
    pub fn for_propagator<P: Propagator + ?Sized>(propagator: &P, config: &SamplingConfig) -> Result<Self> {
        let start = propagator.epoch()?;
        let period = propagator.period_minutes()?;
        Ok(Self {
            start,
            span_minutes: period * config.revolutions,
            step_minutes: config.step_minutes,
        })
    }

    /// Number of candidate samples, `floor(span / step) + 1`
    pub fn sample_count(&self) -> usize {
        let valid = self.step_minutes > 0.0 && self.span_minutes >= 0.0 && self.span_minutes.is_finite();
        if !valid {
            return 0;
        }
        (self.span_minutes / self.step_minutes).floor() as usize + 1
    }

    /// Sample instants from `start` to `start + span`, in order
    pub fn times(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        (0..self.sample_count()).map(move |i| {
            let offset_ms = (i as f64 * self.step_minutes * 60_000.0).round() as i64;
            self.start + Duration::milliseconds(offset_ms)
        })
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::milliseconds((self.span_minutes * 60_000.0).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::tests::{FailingPropagator, ISS_LINE1, NINETY_MIN_LINE2};
    use crate::propagation::SatelliteRecord;

    #[test]
    fn test_ninety_minute_window_has_361_samples() {
        let record = SatelliteRecord::from_tle(ISS_LINE1, NINETY_MIN_LINE2).unwrap();
        let window = SamplingWindow::for_propagator(&record, &SamplingConfig::default()).unwrap();

        assert_eq!(window.span_minutes, 360.0);
        assert_eq!(window.sample_count(), 361);

        let times: Vec<_> = window.times().collect();
        assert_eq!(times.len(), 361);
        assert_eq!(times[0], window.start);
        assert_eq!(*times.last().unwrap(), window.start + Duration::minutes(360));
        assert_eq!(window.end(), window.start + Duration::minutes(360));
    }

    #[test]
    fn test_fractional_span_drops_partial_step() {
        let window = SamplingWindow {
            start: Utc::now(),
            span_minutes: 10.9,
            step_minutes: 1.0,
        };
        assert_eq!(window.sample_count(), 11);
    }

    #[test]
    fn test_degenerate_windows_are_empty() {
        let start = Utc::now();
        for (span, step) in [(10.0, 0.0), (-1.0, 1.0), (f64::NAN, 1.0), (f64::INFINITY, 1.0)] {
            let window = SamplingWindow {
                start,
                span_minutes: span,
                step_minutes: step,
            };
            assert_eq!(window.sample_count(), 0, "span={} step={}", span, step);
        }
    }

    #[test]
    fn test_window_uses_revolution_count() {
        let failing = FailingPropagator {
            period: 100.0,
            epoch: Utc::now(),
        };
        let config = SamplingConfig {
            revolutions: 2.0,
            ..SamplingConfig::default()
        };
        let window = SamplingWindow::for_propagator(&failing, &config).unwrap();
        assert_eq!(window.span_minutes, 200.0);
        assert_eq!(window.sample_count(), 201);
    }
}
