//! Live constellation sampling
//!
//! One shared simulation instant, many objects: every tick advances the
//! clock and evaluates each object's position at that instant. Objects that
//! fail to propagate are dropped from that frame only.
//!
//! The session is a plain value owned by whatever drives the animation (a
//! tokio task in the gateway, a loop in the CLI). Nothing here is global.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::propagation::{position_at, Propagator, SatelliteRecord};
use crate::{Result, EARTH_MEAN_RADIUS_KM};

const PAYLOAD_COLOR: &str = "#00d9ff";
const DEBRIS_COLOR: &str = "#ff006e";

/// Animation parameters: `sim_step_ms` of simulated time per
/// `tick_interval_ms` of wall time, at most `max_objects` per session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveConfig {
    pub tick_interval_ms: u64,
    pub sim_step_ms: i64,
    pub max_objects: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            sim_step_ms: 3_000,
            max_objects: 3_000,
        }
    }
}

impl LiveConfig {
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }

    pub fn sim_step(&self) -> Duration {
        Duration::milliseconds(self.sim_step_ms)
    }
}

/// Catalog object class, as far as rendering cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    Payload,
    Debris,
    RocketBody,
    Unknown,
}

impl ObjectClass {
    /// Classify free-form catalog labels ("Payload", "Rocket Body", "Payload Debris", ...)
    pub fn from_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.contains("payload") && !label.contains("debris") {
            Self::Payload
        } else if label.contains("debris") {
            Self::Debris
        } else if label.contains("rocket") {
            Self::RocketBody
        } else {
            Self::Unknown
        }
    }

    /// Debris and spent rocket bodies
    pub fn is_debris(&self) -> bool {
        matches!(self, Self::Debris | Self::RocketBody)
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Payload => PAYLOAD_COLOR,
            _ => DEBRIS_COLOR,
        }
    }
}

/// One object in a live session
#[derive(Debug)]
pub struct LiveObject<P = SatelliteRecord> {
    pub norad_id: Option<u64>,
    pub name: String,
    pub class: ObjectClass,
    pub propagator: P,
}

impl LiveObject<SatelliteRecord> {
    pub fn from_tle(name: &str, class_label: &str, line1: &str, line2: &str) -> Result<Self> {
        let propagator = SatelliteRecord::from_tle(line1, line2)?;
        Ok(Self {
            norad_id: Some(propagator.norad_id()),
            name: name.to_string(),
            class: ObjectClass::from_label(class_label),
            propagator,
        })
    }
}

/// Shared simulated instant, advanced in fixed steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    now: DateTime<Utc>,
    step: Duration,
}

impl SimulationClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self { now: start, step }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn advance(&mut self) -> DateTime<Utc> {
        self.now = self.now + self.step;
        self.now
    }
}

/// Render-ready position of one object at the frame instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePosition {
    pub norad_id: Option<u64>,
    pub label: String,
    pub class: ObjectClass,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
    /// Altitude in Earth radii, as globe widgets expect
    pub altitude_ratio: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveFrame {
    pub time: DateTime<Utc>,
    pub positions: Vec<LivePosition>,
    /// Objects that could not be placed at this instant
    pub dropped: usize,
}

/// Objects plus the clock that animates them
pub struct LiveSession<P = SatelliteRecord> {
    objects: Vec<LiveObject<P>>,
    clock: SimulationClock,
    config: LiveConfig,
}

impl<P: Propagator> LiveSession<P> {
    /// Start a session at `start`. Objects beyond `config.max_objects` are
    /// left out to keep each tick within a frame budget.
    pub fn new(mut objects: Vec<LiveObject<P>>, start: DateTime<Utc>, config: LiveConfig) -> Self {
        if objects.len() > config.max_objects {
            warn!(
                "Live session capped at {} of {} objects",
                config.max_objects,
                objects.len()
            );
            objects.truncate(config.max_objects);
        }
        debug!("Live session with {} objects starting at {}", objects.len(), start);

        Self {
            objects,
            clock: SimulationClock::new(start, config.sim_step()),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[LiveObject<P>] {
        &self.objects
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Evaluate every object at one instant
    pub fn sample(&self, time: DateTime<Utc>) -> LiveFrame {
        let positions: Vec<LivePosition> = self
            .objects
            .iter()
            .filter_map(|object| match position_at(&object.propagator, time) {
                Ok(point) => Some(LivePosition {
                    norad_id: object.norad_id,
                    label: object.name.clone(),
                    class: object.class,
                    latitude: point.latitude,
                    longitude: point.longitude,
                    altitude_km: point.altitude_km,
                    altitude_ratio: point.altitude_km / EARTH_MEAN_RADIUS_KM,
                    color: object.class.color().to_string(),
                }),
                Err(e) => {
                    trace!("Dropping {} from frame at {}: {}", object.name, time, e);
                    None
                }
            })
            .collect();

        LiveFrame {
            time,
            dropped: self.objects.len() - positions.len(),
            positions,
        }
    }

    /// Frame at the current simulated instant
    pub fn current_frame(&self) -> LiveFrame {
        self.sample(self.clock.now())
    }

    /// Advance the clock one step and sample
    pub fn tick(&mut self) -> LiveFrame {
        let time = self.clock.advance();
        self.sample(time)
    }
}
