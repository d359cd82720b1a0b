//! Solar time calculator — dusk and dawn for a location and date.
//!
//! Implements the NOAA sunrise equation at civil twilight (solar depression
//! 6°, matching what the original controller asked of its astronomy
//! library). Pure and deterministic: identical inputs always produce
//! identical outputs, and polar conditions come back as typed errors rather
//! than panics — callers decide the fallback (see the scheduler).
//!
//! The calculation works in UTC throughout. Callers pick which *local* date
//! they want via their configured UTC offset and convert the returned
//! instants for display.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::error::ValidationError;
use crate::time::Timestamp;

/// Solar depression angle for civil twilight, in degrees below the horizon.
const CIVIL_TWILIGHT_DEPRESSION: f64 = 6.0;

/// Obliquity of the ecliptic, degrees.
const OBLIQUITY: f64 = 23.4397;

/// Dawn and dusk instants for one date, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SunTimes {
    pub dawn: Timestamp,
    pub dusk: Timestamp,
}

/// The sun's path never crosses the twilight depression on this date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SolarError {
    /// The sun never descends to civil twilight — no dusk or dawn exists
    /// (polar summer).
    #[error("polar day: sun never reaches civil twilight")]
    PolarDay,
    /// The sun never ascends to civil twilight — no dusk or dawn exists
    /// (polar winter).
    #[error("polar night: sun never reaches civil twilight")]
    PolarNight,
}

/// Reject coordinates outside the valid ranges.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidCoordinates`] when latitude is outside
/// ±90° or longitude outside ±180°.
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), ValidationError> {
    if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
        return Err(ValidationError::InvalidCoordinates { lat, lon });
    }
    Ok(())
}

/// Compute civil dawn and dusk for `date` at the given location.
///
/// `lat` is degrees north, `lon` degrees east.
///
/// # Errors
///
/// Returns [`SolarError`] when the sun never crosses the twilight
/// depression on that date (polar day or polar night).
pub fn sun_times(lat: f64, lon: f64, date: NaiveDate) -> Result<SunTimes, SolarError> {
    // Days since the J2000 epoch (2000-01-01 12:00 UTC).
    let epoch = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN);
    let n = f64::from(
        i32::try_from(date.signed_duration_since(epoch).num_days()).unwrap_or(0),
    );

    // Mean solar time at this longitude.
    let j_star = n + 0.0008 - lon / 360.0;

    // Solar mean anomaly and equation of the center.
    let m = (357.5291 + 0.985_600_28 * j_star).rem_euclid(360.0);
    let m_rad = m.to_radians();
    let c = 1.9148 * m_rad.sin() + 0.0200 * (2.0 * m_rad).sin() + 0.0003 * (3.0 * m_rad).sin();

    // Ecliptic longitude and solar transit.
    let lambda = (m + c + 180.0 + 102.9372).rem_euclid(360.0);
    let lambda_rad = lambda.to_radians();
    let j_transit = j_star + 0.0053 * m_rad.sin() - 0.0069 * (2.0 * lambda_rad).sin();

    // Declination of the sun.
    let sin_decl = lambda_rad.sin() * OBLIQUITY.to_radians().sin();
    let cos_decl = (1.0 - sin_decl * sin_decl).sqrt();

    // Hour angle at the twilight depression.
    let lat_rad = lat.to_radians();
    let cos_hour_angle = ((-CIVIL_TWILIGHT_DEPRESSION).to_radians().sin()
        - lat_rad.sin() * sin_decl)
        / (lat_rad.cos() * cos_decl);

    if cos_hour_angle > 1.0 {
        // The sun never climbs up to the depression angle.
        return Err(SolarError::PolarNight);
    }
    if cos_hour_angle < -1.0 {
        // The sun never sinks down to the depression angle.
        return Err(SolarError::PolarDay);
    }

    let hour_angle = cos_hour_angle.acos().to_degrees() / 360.0;
    Ok(SunTimes {
        dawn: from_j2000(j_transit - hour_angle),
        dusk: from_j2000(j_transit + hour_angle),
    })
}

/// Convert fractional days since the J2000 epoch into a UTC timestamp.
#[allow(clippy::cast_possible_truncation)]
fn from_j2000(days: f64) -> Timestamp {
    let epoch = Utc
        .with_ymd_and_hms(2000, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Timestamp::default);
    epoch + Duration::milliseconds((days * 86_400_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn should_be_deterministic_for_identical_inputs() {
        let a = sun_times(42.33, -83.05, date(2024, 6, 1)).unwrap();
        let b = sun_times(42.33, -83.05, date(2024, 6, 1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn should_place_dawn_before_dusk() {
        let times = sun_times(42.33, -83.05, date(2024, 3, 20)).unwrap();
        assert!(times.dawn < times.dusk);
    }

    #[test]
    fn should_compute_plausible_equinox_times_at_the_equator() {
        // Civil dawn at (0, 0) on an equinox is around 05:45 UTC and civil
        // dusk around 18:30 UTC. Allow generous bounds; the point is the
        // shape, not arc-second accuracy.
        let times = sun_times(0.0, 0.0, date(2024, 3, 20)).unwrap();
        let dawn_h = f64::from(times.dawn.hour()) + f64::from(times.dawn.minute()) / 60.0;
        let dusk_h = f64::from(times.dusk.hour()) + f64::from(times.dusk.minute()) / 60.0;
        assert!((5.0..6.2).contains(&dawn_h), "dawn at {dawn_h}");
        assert!((18.0..19.2).contains(&dusk_h), "dusk at {dusk_h}");
    }

    #[test]
    fn should_compute_plausible_midsummer_times_in_london() {
        // London, 2024-06-21: civil dawn ≈ 02:40 UTC, civil dusk ≈ 21:30 UTC.
        let times = sun_times(51.5, -0.13, date(2024, 6, 21)).unwrap();
        let dawn_h = f64::from(times.dawn.hour()) + f64::from(times.dawn.minute()) / 60.0;
        let dusk_h = f64::from(times.dusk.hour()) + f64::from(times.dusk.minute()) / 60.0;
        assert!((2.0..3.5).contains(&dawn_h), "dawn at {dawn_h}");
        assert!((20.8..22.2).contains(&dusk_h), "dusk at {dusk_h}");
    }

    #[test]
    fn should_return_polar_day_in_arctic_summer() {
        assert_eq!(
            sun_times(78.0, 15.6, date(2024, 6, 21)),
            Err(SolarError::PolarDay)
        );
    }

    #[test]
    fn should_return_polar_night_in_arctic_winter() {
        assert_eq!(
            sun_times(78.0, 15.6, date(2024, 12, 21)),
            Err(SolarError::PolarNight)
        );
    }

    #[test]
    fn should_shift_times_with_longitude() {
        // 90° further west means roughly 6 hours later in UTC.
        let east = sun_times(0.0, 0.0, date(2024, 3, 20)).unwrap();
        let west = sun_times(0.0, -90.0, date(2024, 3, 20)).unwrap();
        let shift = west.dawn - east.dawn;
        assert!((shift.num_minutes() - 360).abs() < 30, "shift {shift}");
    }

    #[test]
    fn should_validate_coordinate_ranges() {
        assert!(validate_coordinates(42.3, -83.0).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, 181.0).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }
}
