//! In-memory model of a decoded elevation sweep.

use crate::Moment;
use chrono::{DateTime, Utc};

/// Scan metadata decoded from a volume header.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarHeader {
    /// Four-character station identifier, e.g. "KTLX".
    pub station: String,
    /// Volume coverage pattern number.
    pub vcp: u16,
    /// Scan timestamp.
    pub scan_time: DateTime<Utc>,
    /// Elevation angle of the sweep in degrees.
    pub elevation_deg: f32,
    /// Which moment the gate values measure.
    pub moment: Moment,
    /// Raw-to-physical conversion: `value = raw * gain + offset`.
    pub gain: f32,
    pub offset: f32,
    /// Distance from the antenna to the start of the first gate, meters.
    pub range_to_first_gate_m: f64,
    /// Gate depth along the radial, meters. Constant within a sweep.
    pub gate_spacing_m: f64,
    /// Gates per radial. Constant within a sweep.
    pub gate_count: usize,
}

impl RadarHeader {
    /// Physical units of the decoded gate values.
    pub fn units(&self) -> &'static str {
        self.moment.units()
    }

    /// Range from the antenna to the center of a gate, meters.
    pub fn gate_center_m(&self, gate: usize) -> f64 {
        self.range_to_first_gate_m + (gate as f64 + 0.5) * self.gate_spacing_m
    }

    /// Outer edge of the last gate; returns beyond this are unobserved.
    pub fn max_range_m(&self) -> f64 {
        self.range_to_first_gate_m + self.gate_count as f64 * self.gate_spacing_m
    }
}

/// One azimuthal sweep of range-binned returns at fixed elevation.
///
/// Gate values are in physical units; `None` marks the no-data sentinel,
/// which is distinct from a measured zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Radial {
    /// Azimuth angle in degrees, [0, 360).
    pub azimuth_deg: f32,
    /// Elevation angle in degrees.
    pub elevation_deg: f32,
    /// Gate values ordered by increasing range.
    pub gates: Vec<Option<f32>>,
}

/// An azimuth span not covered by any radial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageGap {
    /// Azimuth of the radial before the gap, degrees.
    pub from_deg: f32,
    /// Azimuth of the radial after the gap, degrees.
    pub to_deg: f32,
    /// Angular width of the gap, degrees.
    pub width_deg: f32,
}

/// Ordered radials forming one complete elevation sweep, plus the header
/// they were decoded with. Radials are kept sorted by azimuth.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialSet {
    header: RadarHeader,
    radials: Vec<Radial>,
}

impl RadialSet {
    /// Build a sweep from decoded radials. Radials are sorted by azimuth;
    /// input order does not matter.
    pub fn new(header: RadarHeader, mut radials: Vec<Radial>) -> Self {
        radials.sort_by(|a, b| {
            a.azimuth_deg
                .partial_cmp(&b.azimuth_deg)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { header, radials }
    }

    pub fn header(&self) -> &RadarHeader {
        &self.header
    }

    /// Radials in ascending azimuth order.
    pub fn radials(&self) -> &[Radial] {
        &self.radials
    }

    pub fn len(&self) -> usize {
        self.radials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radials.is_empty()
    }

    /// Find azimuth gaps wider than `tolerance_deg`, including the
    /// wraparound span between the last and first radials.
    ///
    /// Gaps are reported, never fatal: a sweep with holes still resamples,
    /// with the uncovered cells coming out as no-data.
    pub fn coverage_gaps(&self, tolerance_deg: f32) -> Vec<CoverageGap> {
        if self.radials.len() < 2 {
            return Vec::new();
        }

        let mut gaps = Vec::new();
        for i in 0..self.radials.len() {
            let from = self.radials[i].azimuth_deg;
            let to = self.radials[(i + 1) % self.radials.len()].azimuth_deg;
            let width = (to - from).rem_euclid(360.0);
            if width > tolerance_deg {
                gaps.push(CoverageGap {
                    from_deg: from,
                    to_deg: to,
                    width_deg: width,
                });
            }
        }
        gaps
    }
}
