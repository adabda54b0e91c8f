//! Reentry Debris Catalog
//!
//! Loads catalog records (name, class, NORAD id, reentry site, TLE pair),
//! turns them into ground tracks and 3D orbit paths through
//! `orbital-mechanics`, and exports the results as JSON/GeoJSON.
//!
//! Catalog files come from two generations of tooling, so record fields
//! accept both naming schemes:
//!
//! | Field            | Accepted keys                     |
//! |------------------|-----------------------------------|
//! | name             | `OBJECT_NAME`, `nombre`, `name`   |
//! | class            | `OBJECT_CLASS`, `clase_objeto`    |
//! | NORAD id         | `NORAD_CAT_ID`, `norad_id`        |
//! | TLE line 1 / 2   | `TLE_LINE1`/`TLE_LINE2`, `tle1`/`tle2` |
//! | reentry site     | `reentry_site`, `lugar_caida`     |
//! | TLE age (days)   | `days_difference`, `dias_diferencia` |

use orbital_mechanics::{ObjectClass, OrbitalError, SatelliteRecord};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub mod geojson;
pub mod live;
pub mod loader;
pub mod stats;
pub mod trajectory;

pub use stats::CatalogStats;
pub use trajectory::{build_trajectory, TleAge, Trajectory};

/// Message surfaced to users when an object has no element set
pub const NO_TRAJECTORY_NOTICE: &str = "No trajectory available: this object has no TLE";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unrecognized catalog layout")]
    UnrecognizedLayout,
    #[error("No object with NORAD id {0}")]
    UnknownObject(u64),
    #[error("{name}: {}", NO_TRAJECTORY_NOTICE)]
    MissingElementSet { name: String },
    #[error("Orbital error: {0}")]
    Orbital(#[from] OrbitalError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Where the object came down
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReentrySite {
    #[serde(deserialize_with = "lenient_f64")]
    pub lat: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub lon: f64,
}

impl ReentrySite {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// One catalog entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebrisRecord {
    #[serde(default, alias = "OBJECT_NAME", alias = "nombre")]
    pub name: Option<String>,
    #[serde(default, alias = "OBJECT_CLASS", alias = "clase_objeto")]
    pub class: Option<String>,
    #[serde(default, alias = "NORAD_CAT_ID", deserialize_with = "lenient_norad")]
    pub norad_id: Option<u64>,
    #[serde(default, alias = "fecha")]
    pub reentry_date: Option<String>,
    #[serde(default, alias = "TLE_LINE1", alias = "tle1")]
    pub line1: Option<String>,
    #[serde(default, alias = "TLE_LINE2", alias = "tle2")]
    pub line2: Option<String>,
    #[serde(default, alias = "lugar_caida")]
    pub reentry_site: Option<ReentrySite>,
    #[serde(default, alias = "dias_diferencia")]
    pub days_difference: Option<f64>,
}

impl DebrisRecord {
    pub fn display_name(&self) -> String {
        let name = self.name.as_deref().unwrap_or("Unknown");
        match self.norad_id {
            Some(id) => format!("{} ({})", name, id),
            None => name.to_string(),
        }
    }

    pub fn object_class(&self) -> ObjectClass {
        ObjectClass::from_label(self.class.as_deref().unwrap_or(""))
    }

    /// Both TLE lines, when present and non-blank
    pub fn element_set(&self) -> Result<(&str, &str)> {
        match (self.line1.as_deref(), self.line2.as_deref()) {
            (Some(l1), Some(l2)) if !l1.trim().is_empty() && !l2.trim().is_empty() => Ok((l1, l2)),
            _ => Err(CatalogError::MissingElementSet {
                name: self.display_name(),
            }),
        }
    }

    pub fn has_element_set(&self) -> bool {
        self.element_set().is_ok()
    }

    pub fn satellite_record(&self) -> Result<SatelliteRecord> {
        let (line1, line2) = self.element_set()?;
        Ok(SatelliteRecord::from_tle(line1, line2)?)
    }

    /// Reentry point as (latitude, longitude), if it is a usable coordinate
    pub fn reentry_point(&self) -> Option<(f64, f64)> {
        self.reentry_site.filter(ReentrySite::is_valid).map(|s| (s.lat, s.lon))
    }
}

/// Numbers in catalog files are sometimes quoted
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_norad<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<NumberOrText> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 => Some(n as u64),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
