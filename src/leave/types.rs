use std::fmt;
use std::str::FromStr;

use derive_more::{Add, AddAssign, Sum};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{LeaveError, LeaveResult};

/// Category of authorized absence
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveType {
    Annual,
    Sick,
    Maternity,
    Paternity,
    Bereavement,
    Unpaid,
    Marriage,
    Study,
    Custom,
}

impl LeaveType {
    /// Parse a leave type name, reporting unknown names as `UnknownLeaveType`.
    pub fn parse(value: &str) -> LeaveResult<Self> {
        Self::from_str(value.trim()).map_err(|_| LeaveError::UnknownLeaveType(value.to_string()))
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HalfDayPeriod {
    Morning,
    Afternoon,
}

impl HalfDayPeriod {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// A quantity of leave days, counted in half-day units.
///
/// Serialized as a decimal number of days (`1.5`). Only multiples of half a
/// day are representable, so ledger arithmetic never drifts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Add, AddAssign, Sum)]
pub struct Days(u32);

impl Days {
    pub const ZERO: Days = Days(0);
    pub const HALF: Days = Days(1);

    pub const fn whole(days: u32) -> Self {
        Days(days * 2)
    }

    pub const fn from_halves(halves: u32) -> Self {
        Days(halves)
    }

    pub const fn halves(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Convert a decimal day count; rejects negatives and anything that is not
    /// a multiple of 0.5.
    pub fn try_from_f64(value: f64) -> LeaveResult<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(LeaveError::validation(format!(
                "day count must be a non-negative number, got {value}"
            )));
        }
        let halves = value * 2.0;
        if (halves - halves.round()).abs() > 1e-9 || halves > f64::from(u32::MAX) {
            return Err(LeaveError::validation(format!(
                "day count must be a multiple of 0.5, got {value}"
            )));
        }
        Ok(Days(halves.round() as u32))
    }

    pub fn checked_sub(self, other: Days) -> Option<Days> {
        self.0.checked_sub(other.0).map(Days)
    }

    pub fn saturating_sub(self, other: Days) -> Days {
        Days(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Days {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

impl Serialize for Days {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Days {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Days::try_from_f64(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_leave_type_parse_is_case_insensitive() {
        assert_eq!(LeaveType::parse("Annual").unwrap(), LeaveType::Annual);
        assert_eq!(LeaveType::parse(" sick ").unwrap(), LeaveType::Sick);
        assert_eq!(
            LeaveType::parse("sabbatical"),
            Err(LeaveError::UnknownLeaveType("sabbatical".to_string()))
        );
    }

    #[test]
    fn test_leave_type_names_match_serde() {
        for leave_type in LeaveType::iter() {
            let json = serde_json::to_string(&leave_type).unwrap();
            assert_eq!(json, format!("\"{}\"", leave_type.as_str()));
        }
    }

    #[test]
    fn test_days_display_and_json() {
        assert_eq!(Days::whole(12).to_string(), "12");
        assert_eq!(Days::HALF.to_string(), "0.5");
        assert_eq!(serde_json::to_string(&Days::from_halves(7)).unwrap(), "3.5");
        assert_eq!(serde_json::from_str::<Days>("2.5").unwrap(), Days::from_halves(5));
    }

    #[test]
    fn test_days_rejects_odd_fractions() {
        assert!(Days::try_from_f64(0.25).is_err());
        assert!(Days::try_from_f64(-1.0).is_err());
        assert!(serde_json::from_str::<Days>("1.3").is_err());
        assert_eq!(Days::try_from_f64(6.0).unwrap(), Days::whole(6));
    }

    #[test]
    fn test_days_arithmetic() {
        let total: Days = [Days::whole(1), Days::HALF, Days::HALF].into_iter().sum();
        assert_eq!(total, Days::whole(2));
        assert_eq!(Days::whole(1).checked_sub(Days::whole(2)), None);
        assert_eq!(Days::whole(1).saturating_sub(Days::whole(2)), Days::ZERO);
    }
}
