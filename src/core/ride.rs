//! Ride records and the fixed-point coordinates they are stored with.
//!
//! Coordinates live in a `decimal(8,3)`-shaped column: three fractional
//! digits and a magnitude strictly below `100000`. [`Fixed3`] keeps them as
//! integer thousandths so stored values compare exactly and render with a
//! stable three-digit fraction.

use crate::core::error::{Result, RideLogError};
use crate::core::geometry::{self, Point};
use crate::core::time;
use serde::{Serialize, Serializer};
use std::fmt;

/// Exclusive bound on a coordinate, in thousandths (`100000.000`).
pub const FIXED3_LIMIT: i64 = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed3(i64);

impl Fixed3 {
    pub const ZERO: Fixed3 = Fixed3(0);

    pub fn from_thousandths(thousandths: i64) -> Result<Self> {
        if thousandths.unsigned_abs() >= FIXED3_LIMIT as u64 {
            return Err(RideLogError::ValidationError(format!(
                "coordinate {} exceeds decimal(8,3) range",
                Fixed3(thousandths)
            )));
        }
        Ok(Fixed3(thousandths))
    }

    pub fn thousandths(self) -> i64 {
        self.0
    }

    /// Round a finite float to the nearest thousandth, half away from zero.
    ///
    /// Rounding is applied to the shortest decimal form of `value`, so
    /// `1.0005` becomes `1.001` even though its binary value is slightly
    /// below the midpoint.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(RideLogError::ValidationError(format!(
                "coordinate must be finite, got {}",
                value
            )));
        }
        Self::parse_decimal(&value.to_string()).ok_or_else(|| {
            RideLogError::ValidationError(format!("coordinate {} exceeds decimal(8,3) range", value))
        })?
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// `None` when `raw` is not a plain decimal literal.
    fn parse_decimal(raw: &str) -> Option<Result<Self>> {
        let (negative, body) = match raw.as_bytes().first()? {
            b'-' => (true, &raw[1..]),
            b'+' => (false, &raw[1..]),
            _ => (false, raw),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let int_digits = int_part.trim_start_matches('0');
        if int_digits.len() > 5 {
            return Some(Err(RideLogError::ValidationError(format!(
                "coordinate {} exceeds decimal(8,3) range",
                raw
            ))));
        }
        let whole: i64 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().ok()?
        };

        let mut frac: i64 = 0;
        let mut digits = frac_part.bytes();
        for _ in 0..3 {
            frac = frac * 10 + digits.next().map(|b| (b - b'0') as i64).unwrap_or(0);
        }
        if digits.next().is_some_and(|b| b >= b'5') {
            frac += 1;
        }

        let magnitude = whole * 1000 + frac;
        let thousandths = if negative { -magnitude } else { magnitude };
        Some(Self::from_thousandths(thousandths))
    }
}

impl std::str::FromStr for Fixed3 {
    type Err = RideLogError;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if let Some(parsed) = Self::parse_decimal(trimmed) {
            return parsed;
        }
        // Exponent forms (`1e3`) go through the float path; NaN/inf are refused there.
        match trimmed.parse::<f64>() {
            Ok(value) => Self::from_f64(value),
            Err(_) => Err(RideLogError::ValidationError(format!(
                "coordinate '{}' is not a decimal number",
                raw
            ))),
        }
    }
}

impl fmt::Display for Fixed3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:03}", sign, abs / 1000, abs % 1000)
    }
}

impl Serialize for Fixed3 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct FixedPoint {
    pub x: Fixed3,
    pub y: Fixed3,
}

impl FixedPoint {
    pub fn new(x: Fixed3, y: Fixed3) -> Self {
        Self { x, y }
    }

    pub fn to_point(self) -> Point {
        Point::new(self.x.to_f64(), self.y.to_f64())
    }
}

/// A validated ride. Immutable once handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ride {
    pub user_id: String,
    pub start: FixedPoint,
    pub stop: FixedPoint,
    /// Unix timestamp (seconds)
    pub start_time: i64,
    /// Unix timestamp (seconds)
    pub stop_time: i64,
}

impl Ride {
    /// Build a ride from float coordinates, rounding them to three digits.
    pub fn new(
        user_id: &str,
        start: Point,
        stop: Point,
        start_time: i64,
        stop_time: i64,
    ) -> Result<Self> {
        let ride = Self {
            user_id: user_id.to_string(),
            start: FixedPoint::new(Fixed3::from_f64(start.x)?, Fixed3::from_f64(start.y)?),
            stop: FixedPoint::new(Fixed3::from_f64(stop.x)?, Fixed3::from_f64(stop.y)?),
            start_time,
            stop_time,
        };
        ride.check(&ValidationPolicy::default())?;
        Ok(ride)
    }

    pub fn distance(&self) -> Result<f64> {
        geometry::distance(self.start.to_point(), self.stop.to_point())
    }

    /// Check the invariants a hand-built `Ride` may have skipped.
    pub fn check(&self, policy: &ValidationPolicy) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(RideLogError::ValidationError(
                "user_id must not be empty".to_string(),
            ));
        }
        time::check_epoch_seconds("start_time", self.start_time)?;
        time::check_epoch_seconds("stop_time", self.stop_time)?;
        if policy.enforce_time_order && self.stop_time < self.start_time {
            return Err(RideLogError::ValidationError(format!(
                "stop_time {} precedes start_time {}",
                self.stop_time, self.start_time
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub enforce_time_order: bool,
}

/// Ride fields as they arrive from the outside, still unparsed.
#[derive(Debug, Clone, Default)]
pub struct RideInput {
    pub user_id: String,
    pub start_x: String,
    pub start_y: String,
    pub stop_x: String,
    pub stop_y: String,
    pub start_time: String,
    pub stop_time: String,
}

impl RideInput {
    pub fn parse(&self, policy: &ValidationPolicy) -> Result<Ride> {
        let ride = Ride {
            user_id: self.user_id.clone(),
            start: FixedPoint::new(
                parse_coordinate("start_x", &self.start_x)?,
                parse_coordinate("start_y", &self.start_y)?,
            ),
            stop: FixedPoint::new(
                parse_coordinate("stop_x", &self.stop_x)?,
                parse_coordinate("stop_y", &self.stop_y)?,
            ),
            start_time: time::parse_epoch_seconds("start_time", &self.start_time)?,
            stop_time: time::parse_epoch_seconds("stop_time", &self.stop_time)?,
        };
        ride.check(policy)?;
        Ok(ride)
    }
}

fn parse_coordinate(field: &str, raw: &str) -> Result<Fixed3> {
    raw.parse::<Fixed3>().map_err(|e| match e {
        RideLogError::ValidationError(msg) => {
            RideLogError::ValidationError(format!("{}: {}", field, msg))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(user_id: &str) -> RideInput {
        RideInput {
            user_id: user_id.to_string(),
            start_x: "0".to_string(),
            start_y: "0".to_string(),
            stop_x: "3".to_string(),
            stop_y: "4".to_string(),
            start_time: "1510000000".to_string(),
            stop_time: "1510000600".to_string(),
        }
    }

    #[test]
    fn test_fixed3_parses_and_rounds_half_away_from_zero() {
        assert_eq!("1.5".parse::<Fixed3>().unwrap().thousandths(), 1500);
        assert_eq!("1.0005".parse::<Fixed3>().unwrap().thousandths(), 1001);
        assert_eq!("-1.0005".parse::<Fixed3>().unwrap().thousandths(), -1001);
        assert_eq!("2.0004".parse::<Fixed3>().unwrap().thousandths(), 2000);
        assert_eq!(" .25 ".parse::<Fixed3>().unwrap().thousandths(), 250);
        assert_eq!("1e2".parse::<Fixed3>().unwrap().thousandths(), 100_000);
    }

    #[test]
    fn test_fixed3_rejects_malformed_and_non_finite() {
        for raw in ["", "-", ".", "abc", "1.2.3", "NaN", "inf", "-infinity"] {
            assert!(raw.parse::<Fixed3>().is_err(), "{raw}");
        }
    }

    #[test]
    fn test_fixed3_range_matches_decimal_8_3() {
        assert!("99999.999".parse::<Fixed3>().is_ok());
        assert!("100000".parse::<Fixed3>().is_err());
        assert!("-100000.000".parse::<Fixed3>().is_err());
        assert!("00000012.5".parse::<Fixed3>().is_ok());
        assert!(Fixed3::from_f64(1e300).is_err());
    }

    #[test]
    fn test_fixed3_display_keeps_three_digits() {
        assert_eq!(Fixed3::from_f64(3.0).unwrap().to_string(), "3.000");
        assert_eq!(Fixed3::from_f64(-0.5).unwrap().to_string(), "-0.500");
        assert_eq!(Fixed3::from_f64(12.3456).unwrap().to_string(), "12.346");
    }

    #[test]
    fn test_ride_input_parses_to_ride() {
        let ride = input("u1").parse(&ValidationPolicy::default()).unwrap();
        assert_eq!(ride.user_id, "u1");
        assert_eq!(ride.stop.y.to_string(), "4.000");
        assert_eq!(ride.distance().unwrap(), 5.0);
    }

    #[test]
    fn test_ride_input_rejects_empty_user() {
        let err = input("  ").parse(&ValidationPolicy::default()).unwrap_err();
        assert!(matches!(err, RideLogError::ValidationError(_)));
    }

    #[test]
    fn test_ride_input_names_bad_field() {
        let mut raw = input("u1");
        raw.stop_x = "east".to_string();
        let err = raw.parse(&ValidationPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("stop_x"));
    }

    #[test]
    fn test_time_order_only_enforced_when_requested() {
        let mut raw = input("u1");
        raw.stop_time = "1509999999".to_string();
        assert!(raw.parse(&ValidationPolicy::default()).is_ok());

        let strict = ValidationPolicy {
            enforce_time_order: true,
        };
        assert!(raw.parse(&strict).is_err());
    }

    #[test]
    fn test_ride_new_rounds_float_coordinates() {
        let ride = Ride::new("u1", Point::new(0.0004, 0.0), Point::new(1.2345, 0.0), 0, 1).unwrap();
        assert_eq!(ride.start.x, Fixed3::ZERO);
        assert_eq!(ride.stop.x.thousandths(), 1235);
    }
}
