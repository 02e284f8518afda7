//! Radar moment identification.

use serde::{Deserialize, Serialize};

/// A measured radar quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Moment {
    Reflectivity,
    Velocity,
    SpectrumWidth,
}

impl Moment {
    /// Wire code used in the volume header.
    pub fn code(&self) -> u8 {
        match self {
            Moment::Reflectivity => 0,
            Moment::Velocity => 1,
            Moment::SpectrumWidth => 2,
        }
    }

    /// Decode a wire code. Unknown codes are not representable.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Moment::Reflectivity),
            1 => Some(Moment::Velocity),
            2 => Some(Moment::SpectrumWidth),
            _ => None,
        }
    }

    /// Physical units of decoded values.
    pub fn units(&self) -> &'static str {
        match self {
            Moment::Reflectivity => "dBZ",
            Moment::Velocity => "m/s",
            Moment::SpectrumWidth => "m/s",
        }
    }
}

impl std::fmt::Display for Moment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Moment::Reflectivity => "reflectivity",
            Moment::Velocity => "velocity",
            Moment::SpectrumWidth => "spectrum_width",
        };
        f.write_str(name)
    }
}
