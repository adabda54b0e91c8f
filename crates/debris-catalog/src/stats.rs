//! Catalog summary counts

use serde::{Deserialize, Serialize};

use crate::DebrisRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total: usize,
    pub payload: usize,
    /// Debris fragments and rocket bodies
    pub debris: usize,
    pub with_tle: usize,
    pub without_tle: usize,
}

impl CatalogStats {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a DebrisRecord>,
    {
        records.into_iter().fold(Self::default(), |mut stats, record| {
            let class = record.object_class();
            stats.total += 1;
            if class.is_debris() {
                stats.debris += 1;
            } else if class == orbital_mechanics::ObjectClass::Payload {
                stats.payload += 1;
            }
            if record.has_element_set() {
                stats.with_tle += 1;
            } else {
                stats.without_tle += 1;
            }
            stats
        })
    }
}
