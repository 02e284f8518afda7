//! Generators for synthetic radar sweeps.
//!
//! The patterns are predictable so tests can verify resampled values
//! against closed-form expectations.

use chrono::{TimeZone, Utc};
use radar_common::{Moment, Radial, RadarHeader, RadialSet};

/// A header with unit gain, zero offset, and 1 km gates starting at the
/// antenna. Values therefore survive encoding untouched.
pub fn uniform_header(gate_count: usize) -> RadarHeader {
    RadarHeader {
        station: "KTLX".to_string(),
        vcp: 212,
        scan_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        elevation_deg: 0.5,
        moment: Moment::Reflectivity,
        gain: 1.0,
        offset: 0.0,
        range_to_first_gate_m: 0.0,
        gate_spacing_m: 1_000.0,
        gate_count,
    }
}

/// A full-circle sweep of `radial_count` evenly spaced radials where gate
/// `g` of radial `r` holds `(r * 100 + g) as f32`.
pub fn uniform_sweep(radial_count: usize, gate_count: usize) -> RadialSet {
    let step = 360.0 / radial_count as f32;
    let radials = (0..radial_count)
        .map(|r| Radial {
            azimuth_deg: r as f32 * step,
            elevation_deg: 0.5,
            gates: (0..gate_count)
                .map(|g| Some((r * 100 + g) as f32))
                .collect(),
        })
        .collect();
    RadialSet::new(uniform_header(gate_count), radials)
}

/// A full-circle sweep whose gate values depend only on range: gate `g`
/// holds `g * 10` on every radial. Resampling it should reproduce
/// concentric rings regardless of azimuth.
pub fn ring_sweep(radial_count: usize, gate_count: usize) -> RadialSet {
    let step = 360.0 / radial_count as f32;
    let radials = (0..radial_count)
        .map(|r| Radial {
            azimuth_deg: r as f32 * step,
            elevation_deg: 0.5,
            gates: (0..gate_count).map(|g| Some((g * 10) as f32)).collect(),
        })
        .collect();
    RadialSet::new(uniform_header(gate_count), radials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sweep_shape() {
        let sweep = uniform_sweep(8, 4);
        assert_eq!(sweep.len(), 8);
        assert_eq!(sweep.radials()[1].azimuth_deg, 45.0);
        assert_eq!(sweep.radials()[3].gates[2], Some(302.0));
    }

    #[test]
    fn test_ring_sweep_is_azimuth_invariant() {
        let sweep = ring_sweep(4, 3);
        for radial in sweep.radials() {
            assert_eq!(radial.gates, vec![Some(0.0), Some(10.0), Some(20.0)]);
        }
    }
}
