//! The simulation session.
//!
//! A [`Stub`] owns at most one bound [`Listener`]. Every load entry point
//! first releases the current listener (waiting until its port is free),
//! then fetches and validates the new pact, binds, and publishes the pact.
//! Any failure along the way leaves the session unbound with the previous
//! pact still in place.

use super::handler::{EchoHandler, PactHandler};
use crate::config::StubConfig;
use crate::contract::{ContractSource, Pact};
use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::error::StubError;
use crate::filter::Filters;
use crate::server::{Listener, RequestHandler};
use hyper::StatusCode;
use parking_lot::{Mutex, RwLock};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::Level;

/// Everything a request needs to be matched, published as one snapshot.
#[derive(Debug, Clone, Default)]
pub(crate) struct Simulation {
    pub(crate) pact: Arc<Pact>,
    pub(crate) match_body: bool,
    pub(crate) filters: Filters,
}

/// Shared between the session and its bound handler.
///
/// Readers clone the current `Arc` and never hold the lock while matching;
/// writers replace the snapshot wholesale.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    simulation: RwLock<Arc<Simulation>>,
}

impl SessionState {
    pub(crate) fn snapshot(&self) -> Arc<Simulation> {
        Arc::clone(&self.simulation.read())
    }

    fn update(&self, f: impl FnOnce(&Simulation) -> Simulation) {
        let mut current = self.simulation.write();
        *current = Arc::new(f(&current));
    }

    fn set_pact(&self, pact: Arc<Pact>, match_body: bool) {
        self.update(|current| Simulation {
            pact,
            match_body,
            filters: current.filters.clone(),
        });
    }
}

/// A programmable stub server replaying pact interactions.
pub struct Stub {
    config: StubConfig,
    state: Arc<SessionState>,
    listener: Mutex<Option<Listener>>,
    /// Listeners unbound by `dispose` whose accept loops have not been joined yet
    retired: Mutex<Vec<Listener>>,
    /// Serializes load/start/stop so two listeners never coexist
    lifecycle: tokio::sync::Mutex<()>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Stub {
    /// Create an idle stub that will listen on `port` on all interfaces.
    pub fn create(port: u16) -> Self {
        Self::new(StubConfig {
            port,
            ..StubConfig::default()
        })
    }

    pub fn new(config: StubConfig) -> Self {
        Self {
            config,
            state: Arc::new(SessionState::default()),
            listener: Mutex::new(None),
            retired: Mutex::new(Vec::new()),
            lifecycle: tokio::sync::Mutex::new(()),
            diagnostics: Arc::new(TracingSink),
        }
    }

    /// Replace the diagnostics sink.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &StubConfig {
        &self.config
    }

    // ===== Loading =====

    /// Load a pact from a JSON string and start simulating it.
    pub async fn from_json(&self, pact: &str, match_body: bool) -> Result<&Self, StubError> {
        self.from_source(ContractSource::Json(pact.to_string()), match_body)
            .await
    }

    /// Load a pact from a file and start simulating it.
    pub async fn from_file(
        &self,
        path: impl AsRef<Path>,
        match_body: bool,
    ) -> Result<&Self, StubError> {
        self.from_source(ContractSource::File(path.as_ref().to_path_buf()), match_body)
            .await
    }

    /// Load a pact from a pact broker URL and start simulating it.
    pub async fn from_pact_broker(&self, url: &str, match_body: bool) -> Result<&Self, StubError> {
        self.from_source(ContractSource::Broker(url.to_string()), match_body)
            .await
    }

    /// Load a pact from any source and start simulating it.
    ///
    /// Replaces whatever this session was simulating before. Filters are kept.
    pub async fn from_source(
        &self,
        source: ContractSource,
        match_body: bool,
    ) -> Result<&Self, StubError> {
        let _lifecycle = self.lifecycle.lock().await;

        self.emit(
            Level::INFO,
            format!("Loading the pact from {}...", source.describe()),
        );
        self.release().await;

        let text = source.fetch(&self.config.broker).await.map_err(|e| {
            self.emit(Level::ERROR, format!("Failed to fetch the pact: {e}"));
            StubError::from(e)
        })?;

        self.emit(Level::INFO, "Validate the pact file as JSON...".to_string());
        let pact = Pact::parse(&text).map_err(|e| {
            self.emit(Level::ERROR, format!("Failed to read the pact file. {e}"));
            e
        })?;
        self.emit(
            Level::INFO,
            format!("Loaded pact with {} interaction(s)", pact.len()),
        );

        // Published before binding so the first request already sees it;
        // rolled back if the port cannot be bound.
        let previous = self.state.snapshot();
        self.state.set_pact(Arc::new(pact), match_body);

        let handler = PactHandler {
            state: Arc::clone(&self.state),
            body_options: self.config.body_matching,
            diagnostics: Arc::clone(&self.diagnostics),
        };
        if let Err(e) = self.simulate(Arc::new(handler)).await {
            self.state
                .set_pact(Arc::clone(&previous.pact), previous.match_body);
            return Err(e);
        }
        Ok(self)
    }

    /// Start an echo simulation: every request gets `status_code` and its own
    /// body back. The loaded pact and filters are ignored.
    pub async fn echo(&self, status_code: u16) -> Result<&Self, StubError> {
        StatusCode::from_u16(status_code).map_err(|_| StubError::InvalidStatus(status_code))?;

        let _lifecycle = self.lifecycle.lock().await;
        self.release().await;

        let handler = EchoHandler {
            status: status_code,
            diagnostics: Arc::clone(&self.diagnostics),
        };
        self.simulate(Arc::new(handler)).await?;
        Ok(self)
    }

    async fn simulate(&self, handler: Arc<dyn RequestHandler>) -> Result<(), StubError> {
        self.emit(
            Level::INFO,
            format!(
                "Start running the simulation on {}:{}",
                self.config.host, self.config.port
            ),
        );

        let listener = Listener::bind(&self.config.host, self.config.port, handler)
            .await
            .map_err(|e| {
                self.emit(Level::ERROR, e.to_string());
                e
            })?;
        *self.listener.lock() = Some(listener);
        Ok(())
    }

    // ===== Filters =====

    /// Only interactions recorded under this provider state are eligible.
    /// An empty value removes the constraint.
    pub fn filter_on_provider_state(&self, provider_state: &str) -> &Self {
        self.state.update(|current| Simulation {
            filters: current.filters.with_provider_state(provider_state),
            ..current.clone()
        });
        self
    }

    /// Only interactions with this description are eligible.
    /// An empty value removes the constraint.
    pub fn filter_on_description(&self, description: &str) -> &Self {
        self.state.update(|current| Simulation {
            filters: current.filters.with_description(description),
            ..current.clone()
        });
        self
    }

    pub fn clear_filters(&self) -> &Self {
        self.state.update(|current| Simulation {
            filters: Filters::default(),
            ..current.clone()
        });
        self
    }

    pub fn filters(&self) -> Filters {
        self.state.snapshot().filters.clone()
    }

    /// The most recently loaded pact (empty before the first load).
    pub fn pact(&self) -> Arc<Pact> {
        Arc::clone(&self.state.snapshot().pact)
    }

    // ===== Lifecycle =====

    pub fn is_bound(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Address actually bound, when bound. Differs from the configured port
    /// when the stub was created with port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.lock().as_ref().map(Listener::local_addr)
    }

    /// Stop the simulation and wait until the port is released.
    pub async fn stop(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        self.release().await;
    }

    /// Release the port without waiting. Idempotent, callable from any
    /// thread and from outside a runtime.
    ///
    /// The port is free when this returns; the accept loop winds down in the
    /// background and is joined by the next [`stop`](Self::stop) or load.
    pub fn dispose(&self) {
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.unbind();
            self.emit(
                Level::INFO,
                format!("Disposed listener on {}", listener.local_addr()),
            );
            self.retired.lock().push(listener);
        }
    }

    async fn release(&self) {
        let retired = std::mem::take(&mut *self.retired.lock());
        for listener in retired {
            listener.join().await;
        }

        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.shutdown().await;
            self.emit(
                Level::INFO,
                format!("Released listener on {}", listener.local_addr()),
            );
        }
    }

    fn emit(&self, level: Level, message: String) {
        self.diagnostics.emit(level, &message);
    }
}

impl Drop for Stub {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Stub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stub")
            .field("config", &self.config)
            .field("local_addr", &self.local_addr())
            .field("filters", &self.filters())
            .finish()
    }
}
