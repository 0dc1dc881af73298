//! Programmable HTTP stub server for consumer-driven contract tests.
//!
//! A [`Stub`] loads a pact (from a string, a file or a pact broker), binds a
//! port and answers every request with the response of the first recorded
//! interaction that matches it. Requests nothing matches get a 500 response
//! describing the miss. Provider-state and description filters narrow the
//! eligible interactions and can be changed while the stub is running.
//!
//! ```no_run
//! use pact_stub::Stub;
//!
//! # async fn run() -> Result<(), pact_stub::StubError> {
//! let pact = std::fs::read_to_string("pacts/web-widgets.json").unwrap_or_default();
//! let stub = Stub::create(9292);
//! stub.from_json(&pact, true).await?;
//! stub.filter_on_provider_state("widget 1 exists");
//! // ... exercise the consumer against http://localhost:9292 ...
//! stub.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod contract;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod predicate;
pub mod server;
pub mod stub;

pub use config::{LogFormat, LoggingConfig, StubConfig};
pub use contract::{BrokerAuth, ContractSource, FetchOptions, Pact};
pub use diagnostics::{DiagnosticsSink, NullSink, TracingSink};
pub use error::{FetchError, StubError};
pub use filter::Filters;
pub use matcher::{match_interaction, MatchResult, NoMatch};
pub use server::{NormalizedRequest, StubResponse, NO_MATCH_HEADER};
pub use stub::Stub;
