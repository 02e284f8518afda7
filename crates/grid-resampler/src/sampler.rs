//! Point sampling of a radial sweep in polar coordinates.

use crate::{AzimuthMethod, RangeMethod, ResampleOptions};
use radar_common::{Radial, RadialSet};

/// Samples a sweep at arbitrary (range, azimuth) points.
///
/// Radials are already azimuth-sorted by [`RadialSet`]; bracketing is a
/// binary search with wraparound across the 360/0 seam.
pub struct SweepSampler<'a> {
    set: &'a RadialSet,
    opts: &'a ResampleOptions,
}

impl<'a> SweepSampler<'a> {
    pub fn new(set: &'a RadialSet, opts: &'a ResampleOptions) -> Self {
        Self { set, opts }
    }

    /// Sample the sweep at a polar point. `None` means no-data: the point
    /// is outside the observed range, falls in an azimuth coverage hole,
    /// or every contributing gate is itself no-data.
    pub fn sample(&self, range_m: f64, azimuth_deg: f64) -> Option<f32> {
        let radials = self.set.radials();

        if radials.len() == 1 {
            let only = &radials[0];
            let distance = angular_distance(azimuth_deg, only.azimuth_deg as f64);
            if distance > self.opts.azimuth_gap_tolerance_deg {
                return None;
            }
            return self.sample_range(only, range_m);
        }

        let (i_prev, i_next) = self.bracket(azimuth_deg);
        let az_prev = radials[i_prev].azimuth_deg as f64;
        let az_next = radials[i_next].azimuth_deg as f64;

        let d_prev = (azimuth_deg - az_prev).rem_euclid(360.0);
        let d_next = (az_next - azimuth_deg).rem_euclid(360.0);

        // An exact azimuth hit is a direct lookup, not an interpolation, so
        // the neighbor's no-data cannot leak into it.
        if d_prev == 0.0 {
            return self.sample_range(&radials[i_prev], range_m);
        }

        let gap = d_prev + d_next;
        if gap > self.opts.azimuth_gap_tolerance_deg {
            return None;
        }

        match self.opts.azimuth_method {
            AzimuthMethod::Nearest => {
                let index = if d_prev < d_next {
                    i_prev
                } else if d_next < d_prev {
                    i_next
                } else {
                    // Equidistant: deterministically the lower azimuth index.
                    i_prev.min(i_next)
                };
                self.sample_range(&radials[index], range_m)
            }
            AzimuthMethod::Linear => {
                let v_prev = self.sample_range(&radials[i_prev], range_m)?;
                let v_next = self.sample_range(&radials[i_next], range_m)?;
                let t = (d_prev / gap) as f32;
                Some(v_prev * (1.0 - t) + v_next * t)
            }
        }
    }

    /// Indices of the radials bracketing an azimuth, wrapping at the seam.
    fn bracket(&self, azimuth_deg: f64) -> (usize, usize) {
        let radials = self.set.radials();
        let n = radials.len();
        let idx = radials.partition_point(|r| (r.azimuth_deg as f64) <= azimuth_deg);
        let i_next = idx % n;
        let i_prev = (idx + n - 1) % n;
        (i_prev, i_next)
    }

    /// Sample one radial at a range.
    fn sample_range(&self, radial: &Radial, range_m: f64) -> Option<f32> {
        let header = self.set.header();
        if range_m < header.range_to_first_gate_m || range_m >= header.max_range_m() {
            return None;
        }

        match self.opts.range_method {
            RangeMethod::Nearest => {
                let gate =
                    ((range_m - header.range_to_first_gate_m) / header.gate_spacing_m) as usize;
                radial.gates.get(gate).copied().flatten()
            }
            RangeMethod::Linear => {
                // Gate-center coordinates: gate i samples at first + (i+0.5)*spacing.
                let x = (range_m - header.range_to_first_gate_m) / header.gate_spacing_m - 0.5;
                let last = header.gate_count.checked_sub(1)?;

                if x <= 0.0 {
                    return radial.gates.first().copied().flatten();
                }
                if x >= last as f64 {
                    return radial.gates.get(last).copied().flatten();
                }

                let i = x as usize;
                let t = (x - i as f64) as f32;
                let a = (*radial.gates.get(i)?)?;
                if t == 0.0 {
                    return Some(a);
                }
                let b = (*radial.gates.get(i + 1)?)?;
                Some(a * (1.0 - t) + b * t)
            }
        }
    }
}

/// Smallest angular separation between two azimuths, degrees.
fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}
