//! Booking state machine service: creation, guarded status transitions,
//! and party-scoped reads.

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use bookline_core::{
    BookingRequest, BookingStatus, BookingType, CallerContext, CoreError, DomainEvent, Result,
};
use bookline_notify::EventSink;
use bookline_storage::{DynBookingStore, DynIdentityStore};

/// Fields of a booking as submitted by the client side.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingDraft {
    pub creator_identity_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,
    pub booking_type: BookingType,
    #[serde(default)]
    pub notes: Option<String>,
    pub timezone: String,
}

#[derive(Clone)]
pub struct BookingService {
    store: DynBookingStore,
    identities: DynIdentityStore,
    events: EventSink,
}

impl BookingService {
    pub fn new(store: DynBookingStore, identities: DynIdentityStore, events: EventSink) -> Self {
        Self {
            store,
            identities,
            events,
        }
    }

    /// Create a booking addressed to a creator identity. The caller's
    /// current identity becomes the client side and must be verified.
    pub async fn create(&self, ctx: &CallerContext, draft: BookingDraft) -> Result<BookingRequest> {
        let caller = self
            .identities
            .get(ctx.identity_id)
            .await?
            .ok_or_else(|| CoreError::not_found("identity", ctx.identity_id.to_string()))?;
        if !caller.is_verified() {
            return Err(CoreError::NotVerified);
        }
        self.identities
            .get(draft.creator_identity_id)
            .await?
            .ok_or_else(|| {
                CoreError::not_found("identity", draft.creator_identity_id.to_string())
            })?;

        let booking = BookingRequest::new(
            draft.creator_identity_id,
            ctx.identity_id,
            draft.requested_at,
            draft.booking_type,
            draft.notes,
            draft.timezone,
        )?;
        self.store.insert(booking.clone()).await?;
        info!(booking_id = %booking.id, creator = %booking.creator_identity_id, "booking created");
        self.events
            .dispatch(DomainEvent::booking_created(booking.clone()));
        Ok(booking)
    }

    /// Apply a guarded status transition. Only the creator identity
    /// drives status; the client side cannot self-confirm or
    /// self-complete.
    ///
    /// The transition guard runs inside the store's write guard, so a
    /// concurrent transition that commits first invalidates this one
    /// rather than being overwritten by it.
    pub async fn update_status(
        &self,
        ctx: &CallerContext,
        booking_id: Uuid,
        requested: BookingStatus,
    ) -> Result<BookingRequest> {
        let booking = self.party_booking(ctx, booking_id).await?;
        if booking.creator_identity_id != ctx.identity_id {
            return Err(CoreError::forbidden("booking.not_creator"));
        }
        let (previous, booking) = self.store.update_status(booking_id, requested).await?;
        info!(
            %booking_id,
            from = %previous,
            to = %booking.status,
            "booking status changed"
        );
        self.events.dispatch(DomainEvent::booking_status_changed(
            booking.clone(),
            previous,
        ));
        Ok(booking)
    }

    /// Read one booking; the caller must be a party to it.
    pub async fn show(&self, ctx: &CallerContext, booking_id: Uuid) -> Result<BookingRequest> {
        self.party_booking(ctx, booking_id).await
    }

    /// All bookings where the caller's identity is on either side,
    /// newest requested first.
    pub async fn index(&self, ctx: &CallerContext) -> Result<Vec<BookingRequest>> {
        Ok(self.store.list_for_identity(ctx.identity_id).await?)
    }

    /// Fetch a booking, reporting `NotFound` (never `Forbidden`) when
    /// the caller is not a party, so record existence is not leaked.
    async fn party_booking(&self, ctx: &CallerContext, booking_id: Uuid) -> Result<BookingRequest> {
        let booking = self
            .store
            .get(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found("booking", booking_id.to_string()))?;
        if !booking.is_party(ctx.identity_id) {
            return Err(CoreError::not_found("booking", booking_id.to_string()));
        }
        Ok(booking)
    }
}
