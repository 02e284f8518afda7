//! Pipeline orchestration: fetch -> decode -> resample -> emit.
//!
//! One pipeline run is synchronous and sequential; each stage's output is
//! the next stage's sole input. Independent scans (other stations or
//! elevations) run as separate pipelines on separate tasks, sharing only
//! the read-only endpoint list. The pipeline never retries a failed run;
//! that decision belongs to the caller.

pub mod volume;
pub mod writer;

use std::sync::Arc;

use archive2_parser::{DecodeError, DecodeQuality};
pub use archive2_parser::format::GateEncoding;
use chrono::{DateTime, Utc};
use grid_resampler::ResampleOptions;
use radar_common::{GridSpec, Moment, RawMessage};
use thiserror::Error;
use tracing::{info, warn};
use transport::{FetchRequest, ListingRequest, ServerEndpoint, Transport, TransportError};

pub use volume::VolumeTracker;
pub use writer::{CapturedRaster, MemoryWriter, RasterProduct, RasterWriter, WriterError};

/// Where a pipeline currently is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Fetching,
    Decoding,
    Resampling,
    Complete,
    Failed,
}

/// Errors that end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] TransportError),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Emit failed: {0}")]
    Write(#[from] WriterError),
}

/// Non-fatal conditions recorded on a successful run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineWarning {
    /// The radial stream was cut short; the decoded prefix was used.
    PartialDecode {
        decoded: usize,
        declared: usize,
        reason: String,
    },
    /// An azimuth span wider than the configured tolerance had no radials.
    CoverageGap {
        from_deg: f32,
        to_deg: f32,
        width_deg: f32,
    },
    /// A scan timestamp moved backwards across runs.
    TimestampRegression {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::PartialDecode {
                decoded,
                declared,
                reason,
            } => write!(
                f,
                "partial decode: {} of {} radials ({})",
                decoded, declared, reason
            ),
            PipelineWarning::CoverageGap {
                from_deg,
                to_deg,
                width_deg,
            } => write!(
                f,
                "azimuth coverage gap of {:.1} deg between {:.1} and {:.1}",
                width_deg, from_deg, to_deg
            ),
            PipelineWarning::TimestampRegression { previous, current } => write!(
                f,
                "scan time regressed from {} to {}",
                previous, current
            ),
        }
    }
}

/// Summary of one completed run. The raster itself went to the writer.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub station: String,
    pub moment: Moment,
    pub units: &'static str,
    pub scan_time: DateTime<Utc>,
    pub source: String,
    pub grid_cells: usize,
    pub no_data_cells: usize,
    pub warnings: Vec<PipelineWarning>,
}

/// Orchestrates one scan at a time through fetch, decode, resample, emit.
pub struct Pipeline {
    endpoints: Arc<[ServerEndpoint]>,
    transport: Transport,
    grid_spec: GridSpec,
    options: ResampleOptions,
    encoding_override: Option<GateEncoding>,
    state: PipelineState,
    tracker: VolumeTracker,
}

impl Pipeline {
    pub fn new(
        endpoints: Arc<[ServerEndpoint]>,
        transport: Transport,
        grid_spec: GridSpec,
        options: ResampleOptions,
    ) -> Self {
        Self {
            endpoints,
            transport,
            grid_spec,
            options,
            encoding_override: None,
            state: PipelineState::Idle,
            tracker: VolumeTracker::new(),
        }
    }

    /// Force every decode to use the given gate encoding instead of the
    /// header flag.
    pub fn with_encoding_override(mut self, encoding: GateEncoding) -> Self {
        self.encoding_override = Some(encoding);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run one scan for a known remote file.
    pub async fn run(
        &mut self,
        request: &FetchRequest,
        writer: &mut dyn RasterWriter,
    ) -> Result<ScanReport, PipelineError> {
        self.state = PipelineState::Fetching;
        let message = match self.transport.fetch(&self.endpoints, request).await {
            Ok(message) => message,
            Err(err) => {
                self.state = PipelineState::Failed;
                return Err(err.into());
            }
        };

        self.process(message, writer).await
    }

    /// Run one scan for the newest file in a remote directory.
    pub async fn run_latest(
        &mut self,
        request: &ListingRequest,
        writer: &mut dyn RasterWriter,
    ) -> Result<ScanReport, PipelineError> {
        self.state = PipelineState::Fetching;
        let message = match self.transport.fetch_latest(&self.endpoints, request).await {
            Ok(message) => message,
            Err(err) => {
                self.state = PipelineState::Failed;
                return Err(err.into());
            }
        };

        self.process(message, writer).await
    }

    /// Decode, resample, and emit one fetched message.
    async fn process(
        &mut self,
        message: RawMessage,
        writer: &mut dyn RasterWriter,
    ) -> Result<ScanReport, PipelineError> {
        let source = message.source.clone();
        let fetched_at = message.fetched_at;
        let mut warnings = Vec::new();

        self.state = PipelineState::Decoding;
        let decoded = match archive2_parser::decode_with_encoding(message, self.encoding_override) {
            Ok(decoded) => decoded,
            Err(err) => {
                // Structural failures cannot be reinterpreted within a run.
                self.state = PipelineState::Failed;
                return Err(err.into());
            }
        };

        if let DecodeQuality::Partial {
            decoded: kept,
            declared,
            reason,
        } = &decoded.quality
        {
            let warning = PipelineWarning::PartialDecode {
                decoded: *kept,
                declared: *declared,
                reason: reason.clone(),
            };
            warn!(source = %source, "{}", warning);
            warnings.push(warning);
        }

        let set = decoded.radial_set;
        let header = set.header().clone();

        if let Some(warning) = self.tracker.observe(header.scan_time) {
            warn!(station = %header.station, "{}", warning);
            warnings.push(warning);
        }

        for gap in set.coverage_gaps(self.options.azimuth_gap_tolerance_deg as f32) {
            let warning = PipelineWarning::CoverageGap {
                from_deg: gap.from_deg,
                to_deg: gap.to_deg,
                width_deg: gap.width_deg,
            };
            warn!(station = %header.station, "{}", warning);
            warnings.push(warning);
        }

        self.state = PipelineState::Resampling;
        let grid = grid_resampler::resample(&set, &self.grid_spec, &self.options);
        drop(set);

        let report = ScanReport {
            station: header.station.clone(),
            moment: header.moment,
            units: header.units(),
            scan_time: header.scan_time,
            source: source.clone(),
            grid_cells: grid.nx() * grid.ny(),
            no_data_cells: grid.no_data_count(),
            warnings,
        };

        let product = RasterProduct {
            grid: &grid,
            spec: &self.grid_spec,
            header: &header,
            source: &source,
            fetched_at,
        };
        if let Err(err) = writer.write(product).await {
            self.state = PipelineState::Failed;
            return Err(err.into());
        }

        self.state = PipelineState::Complete;
        info!(
            station = %report.station,
            moment = %report.moment,
            cells = report.grid_cells,
            no_data = report.no_data_cells,
            warnings = report.warnings.len(),
            "Scan complete"
        );

        Ok(report)
    }
}
