//! SQLite-backed durable storage.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode**: one writer and multiple concurrent readers.
//! - **Bounded handshake**: connecting is capped by the configured connect
//!   timeout, and idle pooled connections are reaped after the idle timeout.
//! - **Embedded migrations**: `sqlx::migrate!` runs `migrations/001_waitlist.sql`
//!   on every connect. The schema is idempotent.
//!
//! ## Collections
//!
//! Each table is treated as a collection of documents. The `waitlists`
//! collection carries a unique index on `email`, which is what ultimately
//! decides duplicate signups under concurrency.
//!
//! [`SqliteWaitlistRepository`] holds a cloned `SqlitePool` and implements
//! [`crate::persistence::traits::WaitlistStore`].

mod database;
pub(crate) mod helpers;
mod waitlist_repo;

pub use database::Database;
pub use waitlist_repo::SqliteWaitlistRepository;

#[cfg(test)]
pub(crate) use database::testing;
