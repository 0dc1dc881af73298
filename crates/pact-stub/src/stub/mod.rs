//! Stub session lifecycle.
//!
//! - `core`: the [`Stub`] session, its load entry points, filters and lifecycle
//! - `handler`: the request handlers a session binds (pact replay, echo)

mod core;
mod handler;


pub use core::Stub;
