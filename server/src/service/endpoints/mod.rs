//! Endpoint handlers organized by domain

pub mod status;
pub mod waitlist;

pub use status::{DbStatusResponse, HealthResponse, IN_MEMORY_STORAGE};
pub use waitlist::{ConflictResponse, EntriesResponse, SignupRequest, SignupResponse};
