//! Catalog loading from JSON files

use crate::{CatalogError, DebrisRecord, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Keys under which a catalog object may nest its record array
const RECORD_KEYS: [&str; 3] = ["objects", "debris", "records"];

/// Strip control characters and cap the length of free-text labels
fn sanitize_label(label: String) -> String {
    label.chars().filter(|c| !c.is_control()).take(256).collect::<String>().trim().to_string()
}

/// Load a catalog file: a top-level array of records, or an object holding
/// one under `objects`, `debris` or `records`. Entries that do not parse as
/// records are skipped with a warning.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<DebrisRecord>> {
    let path = path.as_ref();
    info!("Loading debris catalog from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let raw: Value = serde_json::from_reader(reader)?;

    parse_catalog(raw)
}

/// Same as [`load_catalog`] for an already-parsed JSON document
pub fn parse_catalog(raw: Value) -> Result<Vec<DebrisRecord>> {
    let entries = match raw {
        Value::Array(entries) => entries,
        Value::Object(mut map) => {
            let key = RECORD_KEYS
                .iter()
                .find(|k| map.get(**k).map_or(false, Value::is_array))
                .ok_or(CatalogError::UnrecognizedLayout)?;
            match map.remove(*key) {
                Some(Value::Array(entries)) => entries,
                _ => return Err(CatalogError::UnrecognizedLayout),
            }
        }
        _ => return Err(CatalogError::UnrecognizedLayout),
    };

    let mut records = Vec::with_capacity(entries.len());
    let mut skipped = 0;

    for (i, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<DebrisRecord>(entry) {
            Ok(mut record) => {
                record.name = record.name.map(sanitize_label);
                record.class = record.class.map(sanitize_label);
                records.push(record);
            }
            Err(e) => {
                warn!("Skipping catalog entry {}: {}", i, e);
                skipped += 1;
            }
        }
    }

    let with_tle = records.iter().filter(|r| r.has_element_set()).count();
    info!(
        "Loaded {} catalog records ({} with TLE, {} skipped)",
        records.len(),
        with_tle,
        skipped
    );

    Ok(records)
}

/// Look up one object by NORAD catalog number
pub fn find_by_norad(records: &[DebrisRecord], norad_id: u64) -> Result<&DebrisRecord> {
    records
        .iter()
        .find(|r| r.norad_id == Some(norad_id))
        .ok_or(CatalogError::UnknownObject(norad_id))
}
