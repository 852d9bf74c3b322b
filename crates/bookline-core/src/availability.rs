//! Availability scheduling model: per-identity recurring weekly time
//! windows, plus the presence signal layered on top of them.

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, Time};
use uuid::Uuid;

use crate::booking::BookingType;
use crate::error::{CoreError, Result};

/// A recurring weekly availability window owned by one identity.
///
/// Identical `(start_time, end_time)` pairs for the same identity and
/// day are rejected by the ledger; merely overlapping windows are
/// allowed and left to the consumer to interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub identity_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub start_time: Time,
    pub end_time: Time,
    pub booking_type: BookingType,
    pub is_available: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AvailabilityRule {
    /// Create a validated rule.
    pub fn new(
        identity_id: Uuid,
        day_of_week: u8,
        start_time: Time,
        end_time: Time,
        booking_type: BookingType,
        is_available: bool,
    ) -> Result<Self> {
        validate_day_of_week(day_of_week)?;
        validate_time_window(start_time, end_time)?;
        Ok(Self {
            id: Uuid::new_v4(),
            identity_id,
            day_of_week,
            start_time,
            end_time,
            booking_type,
            is_available,
            created_at: OffsetDateTime::now_utc(),
        })
    }

    pub fn is_owned_by(&self, identity_id: Uuid) -> bool {
        self.identity_id == identity_id
    }

    /// Apply a partial update, re-validating any changed field.
    pub fn apply(&mut self, patch: &AvailabilityPatch) -> Result<()> {
        let day = patch.day_of_week.unwrap_or(self.day_of_week);
        let start = patch.start_time.unwrap_or(self.start_time);
        let end = patch.end_time.unwrap_or(self.end_time);
        validate_day_of_week(day)?;
        validate_time_window(start, end)?;
        self.day_of_week = day;
        self.start_time = start;
        self.end_time = end;
        if let Some(booking_type) = patch.booking_type {
            self.booking_type = booking_type;
        }
        if let Some(is_available) = patch.is_available {
            self.is_available = is_available;
        }
        Ok(())
    }
}

/// Partial update for a rule; unset fields are left as-is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityPatch {
    pub day_of_week: Option<u8>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub booking_type: Option<BookingType>,
    pub is_available: Option<bool>,
}

fn validate_day_of_week(day: u8) -> Result<()> {
    if day > 6 {
        return Err(CoreError::validation(
            "day_of_week",
            "must be between 0 and 6",
        ));
    }
    Ok(())
}

fn validate_time_window(start: Time, end: Time) -> Result<()> {
    if end <= start {
        return Err(CoreError::invalid_time_range(
            start.to_string(),
            end.to_string(),
        ));
    }
    Ok(())
}

/// Liveness/presence signal, distinct from the scheduling rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
    Busy,
    Available,
}

impl PresenceStatus {
    /// The update_type string carried in the resulting availability
    /// event. `busy` and `available` intentionally reuse the existing
    /// taxonomy rather than introducing new event kinds.
    pub fn update_type(&self) -> AvailabilityUpdateType {
        match self {
            Self::Online | Self::Available => AvailabilityUpdateType::WentOnline,
            Self::Offline => AvailabilityUpdateType::WentOffline,
            Self::Busy => AvailabilityUpdateType::StatusChanged,
        }
    }
}

/// What kind of availability change an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityUpdateType {
    ScheduleChanged,
    BulkUpdate,
    WentOnline,
    WentOffline,
    StatusChanged,
}

impl AvailabilityUpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScheduleChanged => "schedule_changed",
            Self::BulkUpdate => "bulk_update",
            Self::WentOnline => "went_online",
            Self::WentOffline => "went_offline",
            Self::StatusChanged => "status_changed",
        }
    }
}

impl std::fmt::Display for AvailabilityUpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
