//! HTTP fetch attempts over a shared client.

use crate::error::FetchFailure;
use bytes::Bytes;
use reqwest::Client;

/// Fetch a binary payload. Non-success status, an empty body, and a body
/// shorter than the declared Content-Length all count as failures.
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Bytes, FetchFailure> {
    let response = client.get(url).send().await.map_err(classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchFailure::Status(status.as_u16()));
    }

    let declared = response.content_length();
    let body = response.bytes().await.map_err(classify)?;

    if body.is_empty() {
        return Err(FetchFailure::EmptyBody);
    }
    if let Some(expected) = declared {
        if (body.len() as u64) < expected {
            return Err(FetchFailure::Truncated {
                expected,
                actual: body.len() as u64,
            });
        }
    }

    Ok(body)
}

/// Fetch a text document (directory listings).
pub async fn fetch_text(client: &Client, url: &str) -> Result<String, FetchFailure> {
    let response = client.get(url).send().await.map_err(classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchFailure::Status(status.as_u16()));
    }

    response.text().await.map_err(classify)
}

fn classify(err: reqwest::Error) -> FetchFailure {
    if err.is_timeout() {
        FetchFailure::Timeout
    } else if err.is_connect() {
        FetchFailure::Connect(err.to_string())
    } else {
        FetchFailure::Protocol(err.to_string())
    }
}
