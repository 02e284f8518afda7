//! End-to-end pipeline runs against local stub servers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use grid_resampler::{AzimuthMethod, RangeMethod, ResampleOptions};
use pipeline::{
    MemoryWriter, Pipeline, PipelineError, PipelineState, PipelineWarning, RasterProduct,
    RasterWriter, WriterError,
};
use radar_common::{BoundingBox, GridProjection, GridSpec};
use test_utils::{http_stub, refused_addr, RawRadial, StubResponse, VolumeBuilder};
use transport::{FetchRequest, Protocol, ServerEndpoint, Transport};

fn http_endpoint(addr: std::net::SocketAddr, priority: u32) -> ServerEndpoint {
    ServerEndpoint::new(format!("http://{}", addr), Protocol::Http, priority)
}

fn wide_open() -> ResampleOptions {
    ResampleOptions {
        azimuth_method: AzimuthMethod::Linear,
        range_method: RangeMethod::Linear,
        azimuth_gap_tolerance_deg: 180.0,
    }
}

/// A one-cell grid whose center sits at the given bearing/range from the
/// station.
fn single_cell_at(azimuth_deg: f64, range_m: f64) -> GridSpec {
    let east = range_m * azimuth_deg.to_radians().sin();
    let north = range_m * azimuth_deg.to_radians().cos();
    GridSpec::new(
        GridProjection::LocalCartesian,
        BoundingBox::centered_on(east, north, 5.0),
        10.0,
    )
}

/// The two-radial sweep: azimuth 0 carries [10, 20, no-data], azimuth 90
/// carries [30, 40, 50]; unit gain, zero offset, 1 km gates.
fn two_radial_volume() -> Vec<u8> {
    VolumeBuilder::default()
        .with_radial(RawRadial::from_physical(
            0.0,
            0.5,
            &[Some(10.0), Some(20.0), None],
            1.0,
            0.0,
        ))
        .with_radial(RawRadial::from_physical(
            90.0,
            0.5,
            &[Some(30.0), Some(40.0), Some(50.0)],
            1.0,
            0.0,
        ))
        .encode()
}

fn pipeline_for(endpoints: Vec<ServerEndpoint>, spec: GridSpec, opts: ResampleOptions) -> Pipeline {
    Pipeline::new(
        Arc::from(endpoints),
        Transport::new(Duration::from_secs(5)).unwrap(),
        spec,
        opts,
    )
}

fn volume_request() -> FetchRequest {
    FetchRequest {
        path: "KTLX/latest.ar2v".into(),
    }
}

#[tokio::test]
async fn test_angularly_interpolated_cell() {
    let server = http_stub(vec![StubResponse::ok(two_radial_volume())]).await;
    let mut pipeline = pipeline_for(
        vec![http_endpoint(server, 0)],
        single_cell_at(45.0, 500.0),
        wide_open(),
    );
    let mut writer = MemoryWriter::default();

    let report = pipeline.run(&volume_request(), &mut writer).await.unwrap();

    assert_eq!(pipeline.state(), PipelineState::Complete);
    assert_eq!(report.station, "KTLX");
    assert_eq!(report.units, "dBZ");
    assert_eq!(report.grid_cells, 1);
    assert_eq!(report.no_data_cells, 0);

    // Midpoint of 10 (azimuth 0) and 30 (azimuth 90) at the first gate.
    let raster = &writer.rasters[0];
    assert!((raster.values[0] - 20.0).abs() < 1e-3, "got {}", raster.values[0]);
    assert_eq!(raster.mask, vec![false]);
}

#[tokio::test]
async fn test_no_data_bracket_stays_no_data() {
    let server = http_stub(vec![StubResponse::ok(two_radial_volume())]).await;
    let mut pipeline = pipeline_for(
        vec![http_endpoint(server, 0)],
        single_cell_at(45.0, 2_500.0),
        wide_open(),
    );
    let mut writer = MemoryWriter::default();

    let report = pipeline.run(&volume_request(), &mut writer).await.unwrap();

    assert_eq!(report.no_data_cells, 1);
    assert!(writer.rasters[0].values[0].is_nan());
}

#[tokio::test]
async fn test_failover_then_complete() {
    let dead = refused_addr().await;
    let server = http_stub(vec![StubResponse::ok(two_radial_volume())]).await;
    let mut pipeline = pipeline_for(
        vec![http_endpoint(dead, 0), http_endpoint(server, 1)],
        single_cell_at(45.0, 500.0),
        wide_open(),
    );
    let mut writer = MemoryWriter::default();

    let report = pipeline.run(&volume_request(), &mut writer).await.unwrap();

    assert_eq!(pipeline.state(), PipelineState::Complete);
    assert!(report.source.contains(&server.to_string()));
}

#[tokio::test]
async fn test_exhausted_endpoints_fail_the_run() {
    let dead_a = refused_addr().await;
    let dead_b = refused_addr().await;
    let mut pipeline = pipeline_for(
        vec![http_endpoint(dead_a, 0), http_endpoint(dead_b, 1)],
        single_cell_at(45.0, 500.0),
        wide_open(),
    );
    let mut writer = MemoryWriter::default();

    let err = pipeline.run(&volume_request(), &mut writer).await.unwrap_err();

    assert!(matches!(err, PipelineError::Fetch(_)));
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert!(writer.rasters.is_empty());
}

#[tokio::test]
async fn test_unrecognized_payload_fails_the_run() {
    let server = http_stub(vec![StubResponse::ok("<html>not radar data</html>")]).await;
    let mut pipeline = pipeline_for(
        vec![http_endpoint(server, 0)],
        single_cell_at(45.0, 500.0),
        wide_open(),
    );
    let mut writer = MemoryWriter::default();

    let err = pipeline.run(&volume_request(), &mut writer).await.unwrap_err();

    assert!(matches!(err, PipelineError::Decode(_)));
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[tokio::test]
async fn test_truncated_volume_completes_with_warning() {
    let full = two_radial_volume();
    // Cut into the second radial record: 48-byte header, then 2 + 4 + 3
    // bytes for the first record, plus a few bytes of the second.
    let truncated = full[..48 + 9 + 4].to_vec();

    let server = http_stub(vec![StubResponse::ok(truncated)]).await;
    let mut pipeline = pipeline_for(
        vec![http_endpoint(server, 0)],
        single_cell_at(0.0, 500.0),
        wide_open(),
    );
    let mut writer = MemoryWriter::default();

    let report = pipeline.run(&volume_request(), &mut writer).await.unwrap();

    assert_eq!(pipeline.state(), PipelineState::Complete);
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, PipelineWarning::PartialDecode { decoded: 1, declared: 2, .. })));

    // The surviving azimuth-0 radial still resamples.
    assert!((writer.rasters[0].values[0] - 10.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_coverage_gaps_are_flagged_not_fatal() {
    let server = http_stub(vec![StubResponse::ok(two_radial_volume())]).await;
    let mut pipeline = pipeline_for(
        vec![http_endpoint(server, 0)],
        single_cell_at(45.0, 500.0),
        ResampleOptions::default(), // 2.5 degree tolerance
    );
    let mut writer = MemoryWriter::default();

    let report = pipeline.run(&volume_request(), &mut writer).await.unwrap();

    assert_eq!(pipeline.state(), PipelineState::Complete);
    let gaps: Vec<_> = report
        .warnings
        .iter()
        .filter(|w| matches!(w, PipelineWarning::CoverageGap { .. }))
        .collect();
    assert_eq!(gaps.len(), 2);
}

#[tokio::test]
async fn test_stale_scan_time_warns_on_second_run() {
    let fresh = VolumeBuilder {
        scan_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 6, 0).unwrap(),
        ..VolumeBuilder::default()
    }
    .with_radial(RawRadial::from_physical(0.0, 0.5, &[Some(10.0)], 1.0, 0.0));

    let stale = VolumeBuilder {
        scan_time: Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap(),
        ..VolumeBuilder::default()
    }
    .with_radial(RawRadial::from_physical(0.0, 0.5, &[Some(10.0)], 1.0, 0.0));

    let server = http_stub(vec![
        StubResponse::ok(fresh.encode()),
        StubResponse::ok(stale.encode()),
    ])
    .await;

    let mut pipeline = pipeline_for(
        vec![http_endpoint(server, 0)],
        single_cell_at(0.0, 500.0),
        wide_open(),
    );
    let mut writer = MemoryWriter::default();

    let first = pipeline.run(&volume_request(), &mut writer).await.unwrap();
    assert!(first
        .warnings
        .iter()
        .all(|w| !matches!(w, PipelineWarning::TimestampRegression { .. })));

    let second = pipeline.run(&volume_request(), &mut writer).await.unwrap();
    assert!(second
        .warnings
        .iter()
        .any(|w| matches!(w, PipelineWarning::TimestampRegression { .. })));
}

struct FailingWriter;

#[async_trait]
impl RasterWriter for FailingWriter {
    async fn write(&mut self, _product: RasterProduct<'_>) -> Result<(), WriterError> {
        Err(WriterError::Other("disk full".to_string()))
    }
}

#[tokio::test]
async fn test_writer_failure_fails_the_run() {
    let server = http_stub(vec![StubResponse::ok(two_radial_volume())]).await;
    let mut pipeline = pipeline_for(
        vec![http_endpoint(server, 0)],
        single_cell_at(45.0, 500.0),
        wide_open(),
    );

    let err = pipeline
        .run(&volume_request(), &mut FailingWriter)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Write(_)));
    assert_eq!(pipeline.state(), PipelineState::Failed);
}
