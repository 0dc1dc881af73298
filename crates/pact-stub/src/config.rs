//! Configuration for the stub server.
//!
//! Loaded from YAML (see [`StubConfig::from_file`]); every field has a
//! default so an empty file is a valid configuration. The binary layers its
//! command-line flags on top.

use crate::contract::FetchOptions;
use crate::predicate::BodyMatchOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StubConfig {
    /// Interface the listener binds to
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Compare request bodies against recorded bodies
    #[serde(default = "default_match_body")]
    pub match_body: bool,
    #[serde(default)]
    pub body_matching: BodyMatchOptions,
    /// Pact broker retrieval settings
    #[serde(default)]
    pub broker: FetchOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_match_body() -> bool {
    true
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            match_body: default_match_body(),
            body_matching: BodyMatchOptions::default(),
            broker: FetchOptions::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl StubConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: StubConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.host.trim().is_empty() {
            anyhow::bail!("'host' must not be empty");
        }
        if self.broker.timeout_secs == 0 {
            anyhow::bail!("'broker.timeout_secs' must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
