//! TLE epoch resolution
//!
//! A TLE stores its epoch as a two-digit year plus a fractional, 1-based
//! day of year (`YYDDD.DDDDDDDD`). Years below 57 belong to the 2000s,
//! everything else to the 1900s.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{OrbitalError, Result};

/// Two-digit years below this pivot are 20xx, the rest 19xx
pub const CENTURY_PIVOT: f64 = 57.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

// Far beyond any real epoch, far inside chrono's range
const MAX_OFFSET_MS: f64 = 1.0e15;

/// Resolve packed TLE epoch fields into an absolute UTC instant.
///
/// `day` is 1-based: day 1.0 is January 1st 00:00 UTC of the resolved year.
/// `year` must be a two-digit year in `[0, 100)`.
pub fn resolve_epoch(year: f64, day: f64) -> Result<DateTime<Utc>> {
    if !(0.0..100.0).contains(&year) || !day.is_finite() {
        return Err(OrbitalError::InvalidEpoch { year, day });
    }

    let two_digit = year.trunc() as i32;
    let full_year = if year < CENTURY_PIVOT {
        two_digit + 2000
    } else {
        two_digit + 1900
    };

    let new_year = Utc
        .with_ymd_and_hms(full_year, 1, 1, 0, 0, 0)
        .single()
        .ok_or(OrbitalError::InvalidEpoch { year, day })?;

    let offset_ms = ((day - 1.0) * MILLIS_PER_DAY).round();
    if offset_ms.abs() > MAX_OFFSET_MS {
        return Err(OrbitalError::InvalidEpoch { year, day });
    }

    new_year
        .checked_add_signed(Duration::milliseconds(offset_ms as i64))
        .ok_or(OrbitalError::InvalidEpoch { year, day })
}

/// Read the raw epoch fields (columns 19-32) from TLE line 1.
///
/// Unparsable fields come back as NaN so that [`resolve_epoch`] reports them
/// as an invalid epoch instead of silently picking a default.
pub fn epoch_fields(line1: &str) -> (f64, f64) {
    let field = |range: std::ops::Range<usize>| {
        line1
            .get(range)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(f64::NAN)
    };
    (field(18..20), field(20..32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_century_pivot_boundary() {
        let late = resolve_epoch(56.0, 1.0).unwrap();
        assert_eq!(late.year(), 2056);
        assert_eq!((late.month(), late.day(), late.hour()), (1, 1, 0));

        let early = resolve_epoch(57.0, 1.0).unwrap();
        assert_eq!(early.year(), 1957);
    }

    #[test]
    fn test_fractional_day() {
        // Day 32.5 = Feb 1st, 12:00
        let epoch = resolve_epoch(24.0, 32.5).unwrap();
        assert_eq!(epoch.year(), 2024);
        assert_eq!((epoch.month(), epoch.day()), (2, 1));
        assert_eq!(epoch.hour(), 12);
        assert_eq!(epoch.minute(), 0);
    }

    #[test]
    fn test_non_finite_fields_rejected() {
        assert!(matches!(
            resolve_epoch(f64::NAN, 10.0),
            Err(OrbitalError::InvalidEpoch { .. })
        ));
        assert!(matches!(
            resolve_epoch(20.0, f64::INFINITY),
            Err(OrbitalError::InvalidEpoch { .. })
        ));
    }

    #[test]
    fn test_out_of_range_year_rejected() {
        for year in [1.0e10, -1.0, 100.0, 2024.0, f64::MAX] {
            assert!(
                matches!(resolve_epoch(year, 1.0), Err(OrbitalError::InvalidEpoch { .. })),
                "year {} accepted",
                year
            );
        }
        assert_eq!(resolve_epoch(99.0, 1.0).unwrap().year(), 1999);
        assert_eq!(resolve_epoch(0.0, 1.0).unwrap().year(), 2000);
    }

    #[test]
    fn test_epoch_fields_from_line1() {
        let line1 = "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992";
        let (year, day) = epoch_fields(line1);
        assert_eq!(year, 20.0);
        assert!((day - 194.88612269).abs() < 1e-9);

        let epoch = resolve_epoch(year, day).unwrap();
        assert_eq!(epoch.year(), 2020);
        assert_eq!((epoch.month(), epoch.day()), (7, 12));
        assert_eq!(epoch.hour(), 21);
    }

    #[test]
    fn test_epoch_fields_truncated_line() {
        let (year, day) = epoch_fields("1 25544U");
        assert!(year.is_nan());
        assert!(day.is_nan());
    }
}
