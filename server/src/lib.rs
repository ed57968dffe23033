//! Waitlist signup service.
//!
//! Signups are written to a durable SQLite collection when one is
//! configured and reachable, and to an in-process list otherwise. Callers
//! get the same response shapes and the same per-email uniqueness either
//! way; every response names the storage mode that served it.

pub mod config;
pub mod entry;
pub mod persistence;
pub mod service;
pub mod status;

pub use service::{build_router, AppState};
