//! Common types shared across models.

use serde::{Deserialize, Serialize};

/// Vehicle class codes used by the training data and the parking forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    /// Car
    C,
    /// Motorcycle, always parked in the reserved band
    M,
    E,
}

impl VehicleType {
    pub const ALL: [VehicleType; 3] = [VehicleType::C, VehicleType::M, VehicleType::E];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::C => "C",
            VehicleType::M => "M",
            VehicleType::E => "E",
        }
    }

    pub fn is_motorcycle(&self) -> bool {
        matches!(self, VehicleType::M)
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "C" | "c" => Ok(Self::C),
            "M" | "m" => Ok(Self::M),
            "E" | "e" => Ok(Self::E),
            _ => Err(format!("Unknown vehicle type: {}", s)),
        }
    }
}

/// Current time in the format stored in timestamp columns
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
