//! Diagnostics sink injected into a [`Stub`](crate::Stub).
//!
//! The session never reaches for a process-wide logger: it reports through
//! whatever sink it was given. The default forwards to `tracing`, whose
//! subscriber is installed by the binary (or not at all by library users).

use tracing::Level;

/// Receiver of leveled diagnostic messages. Output is never read back.
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, level: Level, message: &str);
}

/// Forwards messages to `tracing` under the `pact_stub` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "pact_stub", "{}", message),
            Level::WARN => tracing::warn!(target: "pact_stub", "{}", message),
            Level::INFO => tracing::info!(target: "pact_stub", "{}", message),
            Level::DEBUG => tracing::debug!(target: "pact_stub", "{}", message),
            _ => tracing::trace!(target: "pact_stub", "{}", message),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn emit(&self, _level: Level, _message: &str) {}
}
