//! Real-world length units accepted for the reference wall.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a unit tag is not recognized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown length unit: {0}")]
pub struct ParseUnitError(pub String);

/// Unit of the wall length typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Meter,
    Centimeter,
    Foot,
}

impl LengthUnit {
    /// All units in the order they are offered to the user.
    pub const ALL: [LengthUnit; 3] = [LengthUnit::Meter, LengthUnit::Centimeter, LengthUnit::Foot];

    /// Multiplier converting a value in this unit to meters.
    pub fn meters_per_unit(self) -> f64 {
        match self {
            LengthUnit::Meter => 1.0,
            LengthUnit::Centimeter => 0.01,
            LengthUnit::Foot => 0.3048,
        }
    }

    /// Short symbol for display ("m", "cm", "ft").
    pub fn symbol(self) -> &'static str {
        match self {
            LengthUnit::Meter => "m",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Foot => "ft",
        }
    }

    /// Stable name used in settings files.
    pub fn as_str(self) -> &'static str {
        match self {
            LengthUnit::Meter => "meter",
            LengthUnit::Centimeter => "centimeter",
            LengthUnit::Foot => "foot",
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthUnit::Meter => write!(f, "Meters (m)"),
            LengthUnit::Centimeter => write!(f, "Centimeters (cm)"),
            LengthUnit::Foot => write!(f, "Feet (ft)"),
        }
    }
}

impl FromStr for LengthUnit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(LengthUnit::Meter),
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => {
                Ok(LengthUnit::Centimeter)
            }
            "ft" | "foot" | "feet" => Ok(LengthUnit::Foot),
            other => Err(ParseUnitError(other.to_string())),
        }
    }
}

/// Convert a length expressed in `unit` to meters.
pub fn to_meters(value: f64, unit: LengthUnit) -> f64 {
    value * unit.meters_per_unit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_meters_fixed_factors() {
        assert!((to_meters(100.0, LengthUnit::Centimeter) - 1.0).abs() < 1e-12);
        assert!((to_meters(1.0, LengthUnit::Foot) - 0.3048).abs() < 1e-12);
        assert_eq!(to_meters(3.0, LengthUnit::Meter), 3.0);
    }

    #[test]
    fn test_parse_unit_aliases() {
        assert_eq!("m".parse::<LengthUnit>(), Ok(LengthUnit::Meter));
        assert_eq!(" CM ".parse::<LengthUnit>(), Ok(LengthUnit::Centimeter));
        assert_eq!("feet".parse::<LengthUnit>(), Ok(LengthUnit::Foot));
        assert!("yd".parse::<LengthUnit>().is_err());
    }

    #[test]
    fn test_unit_serde_names() {
        let json = serde_json::to_string(&LengthUnit::Centimeter).unwrap();
        assert_eq!(json, "\"centimeter\"");
        let unit: LengthUnit = serde_json::from_str("\"foot\"").unwrap();
        assert_eq!(unit, LengthUnit::Foot);
    }
}
