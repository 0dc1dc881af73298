//! Request handlers bound by a stub session: pact replay and echo.

use super::core::SessionState;
use crate::diagnostics::DiagnosticsSink;
use crate::matcher::{match_interaction, MatchResult};
use crate::predicate::BodyMatchOptions;
use crate::server::{NormalizedRequest, RequestHandler, StubResponse};
use std::sync::Arc;
use tracing::Level;

/// Replays the interaction matching each request, or a 500 no-match response.
pub(crate) struct PactHandler {
    pub(crate) state: Arc<SessionState>,
    pub(crate) body_options: BodyMatchOptions,
    pub(crate) diagnostics: Arc<dyn DiagnosticsSink>,
}

impl RequestHandler for PactHandler {
    fn handle(&self, port: u16, request: &NormalizedRequest) -> StubResponse {
        self.diagnostics.emit(
            Level::DEBUG,
            &format!(
                "Pact simulation on port {}: {} {}",
                port, request.method, request.path
            ),
        );

        // One snapshot per request: document and filters always agree
        let simulation = self.state.snapshot();

        match match_interaction(
            request,
            &simulation.pact,
            &simulation.filters,
            simulation.match_body,
            self.body_options,
        ) {
            MatchResult::Matched { index, interaction } => {
                self.diagnostics.emit(
                    Level::DEBUG,
                    &format!(
                        "Matched interaction #{} ({})",
                        index,
                        interaction.description.as_deref().unwrap_or("no description")
                    ),
                );
                StubResponse::from_template(&interaction.response)
            }
            MatchResult::NoMatch(no_match) => {
                self.diagnostics.emit(
                    Level::WARN,
                    &format!(
                        "{} (provider state filter: {:?}, description filter: {:?})",
                        no_match.message(),
                        no_match.provider_state_filter,
                        no_match.description_filter
                    ),
                );
                StubResponse::no_match(&no_match)
            }
        }
    }
}

/// Reflects the request body back with a fixed status code.
pub(crate) struct EchoHandler {
    pub(crate) status: u16,
    pub(crate) diagnostics: Arc<dyn DiagnosticsSink>,
}

impl RequestHandler for EchoHandler {
    fn handle(&self, port: u16, request: &NormalizedRequest) -> StubResponse {
        self.diagnostics.emit(
            Level::DEBUG,
            &format!("Echo simulation on port {port}..."),
        );
        StubResponse::new(self.status, request.body.clone())
    }
}
