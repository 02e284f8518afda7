//! Radar site registry.
//!
//! Station identifiers are validated against a built-in site table before
//! any network fetch is attempted, so a typo fails fast instead of walking
//! the whole endpoint list.

use serde::Deserialize;
use thiserror::Error;

/// A radar site.
#[derive(Debug, Clone, Deserialize)]
pub struct Station {
    /// Four-character ICAO identifier, e.g. "KTLX".
    pub id: String,
    /// Human-readable site name.
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Error)]
pub enum StationError {
    #[error("Unknown radar site: {0}")]
    UnknownStation(String),

    #[error("Invalid station table: {0}")]
    InvalidTable(#[from] serde_json::Error),
}

/// Lookup table of known radar sites.
#[derive(Debug, Clone)]
pub struct StationRegistry {
    stations: Vec<Station>,
}

impl StationRegistry {
    /// The built-in WSR-88D site table.
    pub fn builtin() -> Self {
        // The embedded table is generated from the published site list and
        // parses by construction.
        Self::from_json(include_str!("../data/stations.json"))
            .expect("embedded station table is valid")
    }

    /// Parse a site table from a JSON array of station records.
    pub fn from_json(json: &str) -> Result<Self, StationError> {
        let stations: Vec<Station> = serde_json::from_str(json)?;
        Ok(Self { stations })
    }

    /// Look up a station by identifier (case-insensitive).
    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id.eq_ignore_ascii_case(id))
    }

    /// Validate a station identifier, returning the site record.
    pub fn validate(&self, id: &str) -> Result<&Station, StationError> {
        self.get(id)
            .ok_or_else(|| StationError::UnknownStation(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
