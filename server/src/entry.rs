//! Waitlist entry shape and input validation.
//!
//! Signup input arrives as loose strings and is turned into a [`NewEntry`]
//! by [`NewEntry::parse`]. Only a `NewEntry` can be handed to the
//! repository, so every stored record has a trimmed name, a normalized
//! email and a known plan.

use chrono::{DateTime, SubsecRound, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// `local@domain.tld`-shaped, no whitespace.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Plan a signup is interested in.
///
/// The stored schema historically knew `basic`, `pro` and `enterprise`,
/// while the signup form offers `gold` instead of `pro`. Both spellings are
/// accepted and listed in [`PLAN_CATALOG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredPlan {
    #[default]
    Basic,
    Pro,
    Gold,
    Enterprise,
}

/// Every plan accepted by validation, in the order it is documented.
pub const PLAN_CATALOG: &[PreferredPlan] = &[
    PreferredPlan::Basic,
    PreferredPlan::Pro,
    PreferredPlan::Gold,
    PreferredPlan::Enterprise,
];

impl PreferredPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferredPlan::Basic => "basic",
            PreferredPlan::Pro => "pro",
            PreferredPlan::Gold => "gold",
            PreferredPlan::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for PreferredPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferredPlan {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PLAN_CATALOG
            .iter()
            .copied()
            .find(|plan| plan.as_str() == wanted)
            .ok_or_else(|| EntryError::UnknownPlan(s.to_string()))
    }
}

/// Validation failures for signup input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    #[error("Name is required")]
    MissingName,
    #[error("Email is required")]
    MissingEmail,
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Unknown plan '{0}', expected one of: {names}", names = plan_names())]
    UnknownPlan(String),
}

fn plan_names() -> String {
    PLAN_CATALOG
        .iter()
        .map(PreferredPlan::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Trim and lower-case an email so lookups are case-insensitive.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Validated signup, not yet stored.
///
/// Fields are private so [`NewEntry::parse`] is the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    name: String,
    email: String,
    phone_number: String,
    preferred_plan: PreferredPlan,
}

impl NewEntry {
    /// Validate raw signup fields.
    ///
    /// Blank optional fields fall back to their defaults: an empty phone
    /// number and the `basic` plan.
    pub fn parse(
        name: Option<&str>,
        email: Option<&str>,
        phone_number: Option<&str>,
        preferred_plan: Option<&str>,
    ) -> Result<Self, EntryError> {
        let name = name.map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(EntryError::MissingName);
        }

        let email = email.map(normalize_email).unwrap_or_default();
        if email.is_empty() {
            return Err(EntryError::MissingEmail);
        }
        if !is_valid_email(&email) {
            return Err(EntryError::InvalidEmail(email));
        }

        let preferred_plan = match preferred_plan.map(str::trim) {
            None | Some("") => PreferredPlan::default(),
            Some(plan) => plan.parse()?,
        };

        Ok(Self {
            name: name.to_string(),
            email,
            phone_number: phone_number.map(str::trim).unwrap_or_default().to_string(),
            preferred_plan,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed, lower-cased email.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn preferred_plan(&self) -> PreferredPlan {
        self.preferred_plan
    }
}

/// A stored waitlist signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub preferred_plan: PreferredPlan,
    pub created_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// Stamp a validated signup with a fresh id and the current time.
    ///
    /// The timestamp is truncated to milliseconds, the resolution of the
    /// durable store, so both backends hand out identical values.
    pub fn record(new: NewEntry) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name,
            email: new.email,
            phone_number: new.phone_number,
            preferred_plan: new.preferred_plan,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }
}
