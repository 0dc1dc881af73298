//! Error types for loading contracts and running simulations.
//!
//! Per-request mismatches are not errors: they are a normal
//! [`MatchResult`](crate::matcher::MatchResult) outcome rendered as an HTTP
//! response, so nothing here ever crosses the listener boundary.

use std::path::PathBuf;

/// Errors raised synchronously by the load/start operations of a [`Stub`](crate::Stub).
///
/// Every variant leaves the session unbound; retrying with corrected input is
/// always possible.
#[derive(Debug, thiserror::Error)]
pub enum StubError {
    #[error("The pact is not a valid JSON document: {0}")]
    InvalidContract(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Failed to bind port {port}: {reason}")]
    PortUnavailable { port: u16, reason: String },
    #[error("Invalid echo status code {0}")]
    InvalidStatus(u16),
}

/// Errors raised while retrieving contract text from its source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Pact file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read pact file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Pact broker request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Pact broker returned status {status} for {url}")]
    Status { url: String, status: u16 },
}
