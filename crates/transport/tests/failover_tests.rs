//! Endpoint failover behavior against local stub servers.

use std::time::Duration;
use transport::{
    FetchFailure, FetchRequest, ListingRequest, Protocol, ServerEndpoint, Transport,
    TransportError,
};
use test_utils::{http_stub, http_stub_silent, refused_addr, StubResponse};

fn http_endpoint(addr: std::net::SocketAddr, priority: u32) -> ServerEndpoint {
    ServerEndpoint::new(format!("http://{}", addr), Protocol::Http, priority)
}

fn transport() -> Transport {
    Transport::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_endpoints_tried_in_priority_order() {
    let secondary = http_stub(vec![StubResponse::ok("SECONDARY")]).await;
    let primary = http_stub(vec![StubResponse::ok("PRIMARY")]).await;

    // Listed out of order on purpose; priority rank must win.
    let endpoints = vec![http_endpoint(secondary, 1), http_endpoint(primary, 0)];

    let message = transport()
        .fetch(&endpoints, &FetchRequest { path: "volume".into() })
        .await
        .unwrap();

    assert_eq!(message.payload.as_ref(), b"PRIMARY");
    assert!(message.source.starts_with(&format!("http://{}", primary)));
}

#[tokio::test]
async fn test_failover_past_dead_endpoint() {
    let dead = refused_addr().await;
    let alive = http_stub(vec![StubResponse::ok("DATA")]).await;

    let endpoints = vec![http_endpoint(dead, 0), http_endpoint(alive, 1)];

    let message = transport()
        .fetch(&endpoints, &FetchRequest { path: "volume".into() })
        .await
        .unwrap();

    assert_eq!(message.payload.as_ref(), b"DATA");
}

#[tokio::test]
async fn test_failover_past_http_error_and_empty_body() {
    let not_found = http_stub(vec![StubResponse::status(404)]).await;
    let empty = http_stub(vec![StubResponse::ok("")]).await;
    let good = http_stub(vec![StubResponse::ok("GOOD")]).await;

    let endpoints = vec![
        http_endpoint(not_found, 0),
        http_endpoint(empty, 1),
        http_endpoint(good, 2),
    ];

    let message = transport()
        .fetch(&endpoints, &FetchRequest { path: "volume".into() })
        .await
        .unwrap();

    assert_eq!(message.payload.as_ref(), b"GOOD");
}

#[tokio::test]
async fn test_exhaustion_aggregates_every_reason() {
    let not_found = http_stub(vec![StubResponse::status(404)]).await;
    let dead = refused_addr().await;

    let endpoints = vec![http_endpoint(not_found, 0), http_endpoint(dead, 1)];

    let err = transport()
        .fetch(&endpoints, &FetchRequest { path: "volume".into() })
        .await
        .unwrap_err();

    match err {
        TransportError::AllEndpointsExhausted { attempts } => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0].reason, FetchFailure::Status(404));
            assert!(matches!(attempts[1].reason, FetchFailure::Connect(_)));
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unresponsive_endpoint_times_out() {
    let silent = http_stub_silent().await;
    let endpoints = vec![http_endpoint(silent, 0)];

    let transport = Transport::new(Duration::from_millis(250)).unwrap();
    let err = transport
        .fetch(&endpoints, &FetchRequest { path: "volume".into() })
        .await
        .unwrap_err();

    match err {
        TransportError::AllEndpointsExhausted { attempts } => {
            assert_eq!(attempts.len(), 1);
            assert_eq!(attempts[0].reason, FetchFailure::Timeout);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_latest_downloads_newest_listed_file() {
    let listing = "<html><body>\
        <a href='KTLX_20240501_1200.ar2v'>old</a>\
        <a href='KTLX_20240501_1212.ar2v'>new</a>\
        <a href='readme.txt'>notes</a>\
        </body></html>";

    let server = http_stub(vec![
        StubResponse::ok(listing),
        StubResponse::ok("VOLUME-BYTES"),
    ])
    .await;

    let endpoints = vec![http_endpoint(server, 0)];
    let message = transport()
        .fetch_latest(
            &endpoints,
            &ListingRequest {
                path: "KTLX".into(),
                suffix: ".ar2v".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(message.payload.as_ref(), b"VOLUME-BYTES");
    assert!(message.source.ends_with("KTLX/KTLX_20240501_1212.ar2v"));
}

#[tokio::test]
async fn test_fetch_latest_empty_listing_is_recorded() {
    let server = http_stub(vec![StubResponse::ok("<html></html>")]).await;
    let endpoints = vec![http_endpoint(server, 0)];

    let err = transport()
        .fetch_latest(
            &endpoints,
            &ListingRequest {
                path: "KTLX".into(),
                suffix: ".ar2v".into(),
            },
        )
        .await
        .unwrap_err();

    match err {
        TransportError::AllEndpointsExhausted { attempts } => {
            assert_eq!(attempts.len(), 1);
            assert_eq!(
                attempts[0].reason,
                FetchFailure::NoMatchingFiles(".ar2v".to_string())
            );
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}
