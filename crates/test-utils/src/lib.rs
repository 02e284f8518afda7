//! Shared test utilities for the liveradar workspace.
//!
//! The encoder here is the reference producer of the radial volume wire
//! format; decoder round-trip tests and pipeline end-to-end tests feed on
//! its output.

pub mod encoder;
pub mod generators;
pub mod http_stub;

pub use encoder::{RawRadial, VolumeBuilder};
pub use generators::{ring_sweep, uniform_header, uniform_sweep};
pub use http_stub::{http_stub, http_stub_silent, refused_addr, StubResponse};
