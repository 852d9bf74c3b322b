//! Identity model: the persona a user operates.
//!
//! A user owns one or more identities; at most one of them is active at
//! a time and every domain record (availability, bookings, messages) is
//! owned by an identity, never directly by a user.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Minimum age of a user's newest identity before another may be created.
pub const IDENTITY_CREATION_COOLDOWN: Duration = Duration::hours(72);

/// Maximum accepted alias length.
pub const MAX_ALIAS_LEN: usize = 64;

/// Role an identity plays on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityRole {
    User,
    Creator,
    Host,
    ServiceProvider,
    Admin,
}

impl IdentityRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Creator => "creator",
            Self::Host => "host",
            Self::ServiceProvider => "service_provider",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for IdentityRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who can discover this identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityVisibility {
    Public,
    Members,
    Hidden,
}

/// Verification state of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

/// A persona a user operates through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    /// Unique per owning user
    pub alias: String,
    pub role: IdentityRole,
    pub visibility: IdentityVisibility,
    pub verification_status: VerificationStatus,
    /// Current-identity marker. Invariant: at most one identity per
    /// owner is true; all writes go through the resolver.
    pub is_active: bool,
    /// Business flag: only activatable identities may become current.
    /// Distinct from `is_active` (which says it currently is current).
    pub activatable: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Identity {
    /// Create a new identity. Starts inactive and pending verification.
    pub fn new(
        owner_user_id: Uuid,
        alias: impl Into<String>,
        role: IdentityRole,
        visibility: IdentityVisibility,
    ) -> Result<Self> {
        let alias = alias.into();
        validate_alias(&alias)?;
        Ok(Self {
            id: Uuid::new_v4(),
            owner_user_id,
            alias,
            role,
            visibility,
            verification_status: VerificationStatus::Pending,
            is_active: false,
            activatable: true,
            created_at: OffsetDateTime::now_utc(),
        })
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_user_id == user_id
    }
}

/// Validate an alias: non-empty, bounded length, no surrounding whitespace.
pub fn validate_alias(alias: &str) -> Result<()> {
    if alias.trim().is_empty() {
        return Err(CoreError::validation("alias", "must not be empty"));
    }
    if alias.trim() != alias {
        return Err(CoreError::validation(
            "alias",
            "must not start or end with whitespace",
        ));
    }
    if alias.len() > MAX_ALIAS_LEN {
        return Err(CoreError::validation(
            "alias",
            format!("must be at most {MAX_ALIAS_LEN} characters"),
        ));
    }
    Ok(())
}

/// Remaining cooldown, in whole hours rounded up, before the user may
/// create another identity. `None` when the cooldown has elapsed.
pub fn creation_cooldown_remaining(
    newest_created_at: OffsetDateTime,
    now: OffsetDateTime,
) -> Option<i64> {
    let elapsed = now - newest_created_at;
    if elapsed >= IDENTITY_CREATION_COOLDOWN {
        return None;
    }
    let remaining = IDENTITY_CREATION_COOLDOWN - elapsed;
    let hours = remaining.whole_hours();
    if remaining - Duration::hours(hours) > Duration::ZERO {
        Some(hours + 1)
    } else {
        Some(hours)
    }
}

/// Audit record appended on every successful identity switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySwitchRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Identity the user was acting as before the switch, if any
    pub from_identity_id: Option<Uuid>,
    pub to_identity_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub switched_at: OffsetDateTime,
}

impl IdentitySwitchRecord {
    pub fn new(user_id: Uuid, from_identity_id: Option<Uuid>, to_identity_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            from_identity_id,
            to_identity_id,
            switched_at: OffsetDateTime::now_utc(),
        }
    }
}
