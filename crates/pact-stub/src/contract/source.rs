//! Retrieval of contract text.
//!
//! The core only ever sees the resulting text; this module is a plain
//! fetch-and-return over a literal string, a local file or a pact broker URL.

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where contract text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractSource {
    /// Literal pact JSON
    Json(String),
    /// Path to a pact file on disk
    File(PathBuf),
    /// Pact broker URL returning the pact document
    Broker(String),
}

/// Credentials sent to the pact broker.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BrokerAuth {
    Basic { username: String, password: String },
    Bearer { token: String },
}

/// Options for broker retrieval.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FetchOptions {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<BrokerAuth>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            auth: None,
        }
    }
}

impl ContractSource {
    /// Short human-readable label for logs.
    pub fn describe(&self) -> String {
        match self {
            ContractSource::Json(_) => "the pact string".to_string(),
            ContractSource::File(path) => format!("the pact file {}", path.display()),
            ContractSource::Broker(url) => format!("the pact broker at {url}"),
        }
    }

    /// Retrieve the contract text.
    pub async fn fetch(&self, options: &FetchOptions) -> Result<String, FetchError> {
        match self {
            ContractSource::Json(text) => Ok(text.clone()),
            ContractSource::File(path) => read_file(path).await,
            ContractSource::Broker(url) => fetch_from_broker(url, options).await,
        }
    }
}

async fn read_file(path: &Path) -> Result<String, FetchError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FetchError::NotFound(path.to_path_buf()))
        }
        Err(source) => Err(FetchError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn fetch_from_broker(url: &str, options: &FetchOptions) -> Result<String, FetchError> {
    let http_err = |source| FetchError::Http {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(options.timeout_secs))
        .build()
        .map_err(http_err)?;

    let mut request = client
        .get(url)
        .header("Accept", "application/hal+json, application/json");
    request = match &options.auth {
        Some(BrokerAuth::Basic { username, password }) => {
            request.basic_auth(username, Some(password))
        }
        Some(BrokerAuth::Bearer { token }) => request.bearer_auth(token),
        None => request,
    };

    let response = request.send().await.map_err(http_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(http_err)
}
