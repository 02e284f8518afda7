//! Common types shared across the liveradar workspace.

pub mod bbox;
pub mod grid;
pub mod message;
pub mod moment;
pub mod radial;
pub mod station;

pub use bbox::BoundingBox;
pub use grid::{GridProjection, GridSpec, RasterGrid};
pub use message::RawMessage;
pub use moment::Moment;
pub use radial::{CoverageGap, Radial, RadarHeader, RadialSet};
pub use station::{Station, StationError, StationRegistry};
