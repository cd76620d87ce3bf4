//! GPS codec: decimal degrees <-> degree/minute/second rational triples.
//!
//! EXIF stores each GPS axis as three unsigned RATIONAL values (degrees,
//! minutes, seconds) plus a separate hemisphere reference tag. The sign of a
//! decimal coordinate is therefore never part of the triple itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Denominator used when encoding seconds (1e-4 arc-second resolution).
pub const SECONDS_DENOMINATOR: u32 = 10_000;

/// Errors raised while decoding a rational triple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    /// A component had a zero denominator or the result was not finite.
    #[error("Malformed coordinate: {0}")]
    MalformedCoordinate(String),
}

/// An unsigned EXIF RATIONAL value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub num: u32,
    pub denom: u32,
}

impl Rational {
    pub const fn new(num: u32, denom: u32) -> Self {
        Self { num, denom }
    }

    /// Convert to a float, refusing zero denominators.
    pub fn to_f64(self) -> Result<f64, CoordinateError> {
        if self.denom == 0 {
            return Err(CoordinateError::MalformedCoordinate(format!(
                "zero denominator in {}/0",
                self.num
            )));
        }
        Ok(f64::from(self.num) / f64::from(self.denom))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.denom)
    }
}

/// Degree/minute/second encoding of one coordinate axis (magnitude only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmsTriple {
    pub degrees: Rational,
    pub minutes: Rational,
    pub seconds: Rational,
}

impl DmsTriple {
    pub const fn new(degrees: Rational, minutes: Rational, seconds: Rational) -> Self {
        Self {
            degrees,
            minutes,
            seconds,
        }
    }
}

/// Which axis a coordinate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Latitude,
    Longitude,
}

/// Hemisphere reference carried next to a DMS triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    /// Pick the hemisphere for a signed decimal value on the given axis.
    pub fn for_value(axis: Axis, decimal: f64) -> Self {
        match (axis, decimal.is_sign_negative()) {
            (Axis::Latitude, false) => Hemisphere::North,
            (Axis::Latitude, true) => Hemisphere::South,
            (Axis::Longitude, false) => Hemisphere::East,
            (Axis::Longitude, true) => Hemisphere::West,
        }
    }

    /// Parse an EXIF reference letter (`N`, `S`, `E`, `W`).
    pub fn from_ref(reference: &str) -> Option<Self> {
        match reference.trim().trim_end_matches('\0').to_ascii_uppercase().as_str() {
            "N" => Some(Hemisphere::North),
            "S" => Some(Hemisphere::South),
            "E" => Some(Hemisphere::East),
            "W" => Some(Hemisphere::West),
            _ => None,
        }
    }

    /// The EXIF reference letter.
    pub fn as_ref_str(&self) -> &'static str {
        match self {
            Hemisphere::North => "N",
            Hemisphere::South => "S",
            Hemisphere::East => "E",
            Hemisphere::West => "W",
        }
    }

    /// The axis this hemisphere reference belongs to.
    pub fn axis(&self) -> Axis {
        match self {
            Hemisphere::North | Hemisphere::South => Axis::Latitude,
            Hemisphere::East | Hemisphere::West => Axis::Longitude,
        }
    }

    fn is_negative(&self) -> bool {
        matches!(self, Hemisphere::South | Hemisphere::West)
    }
}

/// Encode the magnitude of a decimal coordinate as a rational triple.
///
/// Degrees and minutes are whole numbers; seconds carry four decimal places.
/// Non-finite input encodes as zero.
pub fn to_dms(decimal: f64) -> DmsTriple {
    let magnitude = if decimal.is_finite() { decimal.abs() } else { 0.0 };

    let mut degrees = magnitude.trunc() as u32;
    let minutes_total = (magnitude - magnitude.trunc()) * 60.0;
    let mut minutes = minutes_total.trunc() as u32;
    let seconds = (minutes_total - minutes_total.trunc()) * 60.0;
    let mut seconds_scaled = (seconds * f64::from(SECONDS_DENOMINATOR)).round() as u32;

    // Rounding can push seconds to exactly 60; carry upwards.
    if seconds_scaled >= 60 * SECONDS_DENOMINATOR {
        seconds_scaled -= 60 * SECONDS_DENOMINATOR;
        minutes += 1;
    }
    if minutes >= 60 {
        minutes -= 60;
        degrees += 1;
    }

    DmsTriple::new(
        Rational::new(degrees, 1),
        Rational::new(minutes, 1),
        Rational::new(seconds_scaled, SECONDS_DENOMINATOR),
    )
}

/// Decode a rational triple into signed decimal degrees.
///
/// Computes `degrees + minutes/60 + seconds/3600`, negated for `S`/`W`.
pub fn from_dms(triple: &DmsTriple, hemisphere: Hemisphere) -> Result<f64, CoordinateError> {
    let degrees = triple.degrees.to_f64()?;
    let minutes = triple.minutes.to_f64()?;
    let seconds = triple.seconds.to_f64()?;

    let magnitude = degrees + minutes / 60.0 + seconds / 3600.0;
    if !magnitude.is_finite() {
        return Err(CoordinateError::MalformedCoordinate(format!(
            "non-finite value from {}, {}, {}",
            triple.degrees, triple.minutes, triple.seconds
        )));
    }

    Ok(if hemisphere.is_negative() {
        -magnitude
    } else {
        magnitude
    })
}

/// Encode a signed decimal coordinate into its triple and hemisphere reference.
pub fn encode(decimal: f64, axis: Axis) -> (DmsTriple, Hemisphere) {
    (to_dms(decimal), Hemisphere::for_value(axis, decimal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: f64, axis: Axis) -> f64 {
        let (triple, hemisphere) = encode(value, axis);
        from_dms(&triple, hemisphere).unwrap()
    }

    #[test]
    fn test_round_trip_latitude_sweep() {
        let mut lat = -90.0;
        while lat <= 90.0 {
            let decoded = round_trip(lat, Axis::Latitude);
            assert!(
                (decoded - lat).abs() < 1e-4,
                "latitude {} decoded as {}",
                lat,
                decoded
            );
            lat += 0.0371;
        }
    }

    #[test]
    fn test_round_trip_longitude_sweep() {
        let mut lon = -180.0;
        while lon <= 180.0 {
            let decoded = round_trip(lon, Axis::Longitude);
            assert!(
                (decoded - lon).abs() < 1e-4,
                "longitude {} decoded as {}",
                lon,
                decoded
            );
            lon += 0.0733;
        }
    }

    #[test]
    fn test_round_trip_boundaries() {
        for value in [90.0, -90.0, 0.0, 1e-9, -1e-9] {
            assert!((round_trip(value, Axis::Latitude) - value).abs() < 1e-4);
        }
        for value in [180.0, -180.0, 179.999_999_9] {
            assert!((round_trip(value, Axis::Longitude) - value).abs() < 1e-4);
        }
    }

    #[test]
    fn test_to_dms_beijing() {
        let triple = to_dms(39.9042);
        assert_eq!(triple.degrees, Rational::new(39, 1));
        assert_eq!(triple.minutes, Rational::new(54, 1));
        // 0.9042° = 54.252' -> 15.12"
        assert_eq!(triple.seconds, Rational::new(151_200, SECONDS_DENOMINATOR));
    }

    #[test]
    fn test_to_dms_encodes_magnitude_only() {
        assert_eq!(to_dms(-33.8688), to_dms(33.8688));
    }

    #[test]
    fn test_to_dms_carries_rounded_seconds() {
        // 59.99999999" rounds to 60" and must carry into minutes.
        let value = 10.0 + 59.0 / 60.0 + 59.999_999_99 / 3600.0;
        let triple = to_dms(value);
        assert_eq!(triple.degrees, Rational::new(11, 1));
        assert_eq!(triple.minutes, Rational::new(0, 1));
        assert_eq!(triple.seconds.num, 0);
    }

    #[test]
    fn test_to_dms_non_finite_is_zero() {
        let triple = to_dms(f64::NAN);
        assert_eq!(triple.degrees.num, 0);
        assert_eq!(triple.minutes.num, 0);
        assert_eq!(triple.seconds.num, 0);
    }

    #[test]
    fn test_from_dms_negates_south_and_west() {
        let triple = DmsTriple::new(
            Rational::new(33, 1),
            Rational::new(30, 1),
            Rational::new(0, 1),
        );
        assert_eq!(from_dms(&triple, Hemisphere::South).unwrap(), -33.5);
        assert_eq!(from_dms(&triple, Hemisphere::West).unwrap(), -33.5);
        assert_eq!(from_dms(&triple, Hemisphere::North).unwrap(), 33.5);
        assert_eq!(from_dms(&triple, Hemisphere::East).unwrap(), 33.5);
    }

    #[test]
    fn test_from_dms_non_unit_denominators() {
        // Cameras often write 4-decimal degrees as a single rational.
        let triple = DmsTriple::new(
            Rational::new(399_042, 10_000),
            Rational::new(0, 1),
            Rational::new(0, 1),
        );
        let decoded = from_dms(&triple, Hemisphere::North).unwrap();
        assert!((decoded - 39.9042).abs() < 1e-9);
    }

    #[test]
    fn test_from_dms_zero_denominator_is_malformed() {
        for triple in [
            DmsTriple::new(Rational::new(39, 0), Rational::new(54, 1), Rational::new(15, 1)),
            DmsTriple::new(Rational::new(39, 1), Rational::new(54, 0), Rational::new(15, 1)),
            DmsTriple::new(Rational::new(39, 1), Rational::new(54, 1), Rational::new(15, 0)),
        ] {
            let result = from_dms(&triple, Hemisphere::North);
            assert!(matches!(
                result,
                Err(CoordinateError::MalformedCoordinate(_))
            ));
        }
    }

    #[test]
    fn test_zero_over_zero_is_malformed_not_nan() {
        let triple = DmsTriple::new(Rational::new(0, 0), Rational::new(0, 1), Rational::new(0, 1));
        assert!(from_dms(&triple, Hemisphere::East).is_err());
    }

    #[test]
    fn test_hemisphere_for_value() {
        assert_eq!(Hemisphere::for_value(Axis::Latitude, 1.0), Hemisphere::North);
        assert_eq!(Hemisphere::for_value(Axis::Latitude, -1.0), Hemisphere::South);
        assert_eq!(Hemisphere::for_value(Axis::Longitude, 0.0), Hemisphere::East);
        assert_eq!(Hemisphere::for_value(Axis::Longitude, -0.5), Hemisphere::West);
    }

    #[test]
    fn test_hemisphere_from_ref() {
        assert_eq!(Hemisphere::from_ref("N"), Some(Hemisphere::North));
        assert_eq!(Hemisphere::from_ref(" s "), Some(Hemisphere::South));
        assert_eq!(Hemisphere::from_ref("E\0"), Some(Hemisphere::East));
        assert_eq!(Hemisphere::from_ref("w"), Some(Hemisphere::West));
        assert_eq!(Hemisphere::from_ref("X"), None);
        assert_eq!(Hemisphere::from_ref(""), None);
    }

    #[test]
    fn test_hemisphere_axis_and_letter() {
        assert_eq!(Hemisphere::North.axis(), Axis::Latitude);
        assert_eq!(Hemisphere::West.axis(), Axis::Longitude);
        assert_eq!(Hemisphere::South.as_ref_str(), "S");
    }
}
