//! Scan-sequence bookkeeping across pipeline runs.

use crate::PipelineWarning;
use chrono::{DateTime, Utc};

/// Tracks scan timestamps across successive runs of one pipeline.
///
/// Scan times within a volume sequence should never move backwards; a
/// regression usually means a stale file was served. It is reported as a
/// warning and the newest timestamp seen so far stays the baseline.
#[derive(Debug, Default)]
pub struct VolumeTracker {
    latest: Option<DateTime<Utc>>,
}

impl VolumeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scan time, returning a warning if it regressed.
    pub fn observe(&mut self, scan_time: DateTime<Utc>) -> Option<PipelineWarning> {
        match self.latest {
            Some(previous) if scan_time < previous => Some(PipelineWarning::TimestampRegression {
                previous,
                current: scan_time,
            }),
            _ => {
                self.latest = Some(scan_time);
                None
            }
        }
    }
}
