//! Live sessions built from catalog records

use chrono::{DateTime, Utc};
use orbital_mechanics::{LiveConfig, LiveObject, LiveSession};
use tracing::{info, warn};

use crate::{DebrisRecord, Result};

/// Objects with a parseable TLE pair, in catalog order, up to
/// `config.max_objects`. Records without TLE or with an unparseable one are
/// left out.
pub fn live_objects<'a, I>(records: I, config: &LiveConfig) -> Vec<LiveObject>
where
    I: IntoIterator<Item = &'a DebrisRecord>,
{
    let mut rejected = 0;
    let objects: Vec<LiveObject> = records
        .into_iter()
        .filter(|r| r.has_element_set())
        .take(config.max_objects)
        .filter_map(|record| match live_object(record) {
            Ok(object) => Some(object),
            Err(e) => {
                warn!("Leaving {} out of live session: {}", record.display_name(), e);
                rejected += 1;
                None
            }
        })
        .collect();

    if rejected > 0 {
        info!("{} records rejected for live session", rejected);
    }
    objects
}

/// Catalog NORAD id wins over the TLE's catalog number
fn live_object(record: &DebrisRecord) -> Result<LiveObject> {
    let (line1, line2) = record.element_set()?;
    let mut object = LiveObject::from_tle(
        record.name.as_deref().unwrap_or("Unknown"),
        record.class.as_deref().unwrap_or(""),
        line1,
        line2,
    )?;
    object.norad_id = record.norad_id.or(object.norad_id);
    Ok(object)
}

/// Start a live session over a catalog at `start` (usually now)
pub fn start_session<'a, I>(records: I, start: DateTime<Utc>, config: LiveConfig) -> LiveSession
where
    I: IntoIterator<Item = &'a DebrisRecord>,
{
    LiveSession::new(live_objects(records, &config), start, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{iss_record, ISS_LINE1};
    use chrono::Duration;
    use orbital_mechanics::{ObjectClass, Propagator};

    #[test]
    fn test_session_skips_unusable_records() {
        let mut junk = iss_record();
        junk.name = Some("BROKEN".to_string());
        junk.line2 = Some("2 garbage".to_string());

        let no_tle = crate::DebrisRecord {
            name: Some("NO TLE".to_string()),
            ..Default::default()
        };

        let mut debris = iss_record();
        debris.name = Some("ISS DEB".to_string());
        debris.class = Some("Debris".to_string());
        debris.norad_id = None;

        let records = vec![iss_record(), junk, no_tle, debris];
        let start = iss_record().satellite_record().unwrap().epoch().unwrap();
        let mut session = start_session(&records, start, LiveConfig::default());

        assert_eq!(session.len(), 2);
        let frame = session.tick();
        assert_eq!(frame.time, start + Duration::seconds(3));
        assert_eq!(frame.positions.len(), 2);
        assert_eq!(frame.positions[1].class, ObjectClass::Debris);
        assert_eq!(frame.positions[1].color, "#ff006e");
        // NORAD id falls back to the TLE's catalog number
        assert_eq!(frame.positions[1].norad_id, Some(25544));
    }

    #[test]
    fn test_catalog_norad_id_overrides_tle() {
        let mut record = iss_record();
        record.norad_id = Some(90001);
        record.class = None;

        let object = live_object(&record).unwrap();
        assert_eq!(object.norad_id, Some(90001));
        assert_eq!(object.name, "ISS (ZARYA)");
        assert_eq!(object.class, ObjectClass::Unknown);

        record.line1 = None;
        assert!(matches!(
            live_object(&record),
            Err(crate::CatalogError::MissingElementSet { .. })
        ));
    }

    #[test]
    fn test_cap_applies_to_records_with_tle() {
        let mut records = vec![crate::DebrisRecord::default(); 5];
        records.extend((0..5).map(|_| iss_record()));
        let config = LiveConfig {
            max_objects: 3,
            ..LiveConfig::default()
        };

        let objects = live_objects(&records, &config);
        assert_eq!(objects.len(), 3);
        assert!(ISS_LINE1.contains(&objects[0].norad_id.unwrap().to_string()));
    }
}
