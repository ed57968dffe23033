//! Shared encode/decode helpers for SQLite ↔ domain type conversions.
//!
//! Plans are stored as `TEXT` matching the schema's CHECK constraint and
//! timestamps as `INTEGER` milliseconds since the Unix epoch.

use chrono::{DateTime, Utc};

use crate::entry::{PreferredPlan, WaitlistEntry};
use crate::persistence::PersistenceError;

/// Column tuple for a `waitlists` row:
/// `(id, name, email, phone_number, preferred_plan, created_at)`.
pub type WaitlistRow = (String, String, String, String, String, i64);

// ── created_at ─────────────────────────────────────────────────────────

pub fn encode_created_at(at: &DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub fn decode_created_at(millis: i64) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| PersistenceError::InvalidRecord(format!("created_at out of range: {millis}")))
}

// ── PreferredPlan ──────────────────────────────────────────────────────

pub fn decode_plan(s: &str) -> Result<PreferredPlan, PersistenceError> {
    s.parse()
        .map_err(|e| PersistenceError::InvalidRecord(format!("preferred_plan: {e}")))
}

// ── rows ───────────────────────────────────────────────────────────────

pub fn decode_row(row: WaitlistRow) -> Result<WaitlistEntry, PersistenceError> {
    let (id, name, email, phone_number, preferred_plan, created_at) = row;
    Ok(WaitlistEntry {
        id,
        name,
        email,
        phone_number,
        preferred_plan: decode_plan(&preferred_plan)?,
        created_at: decode_created_at(created_at)?,
    })
}
