//! Booking endpoints: creation, party-scoped reads, and guarded status
//! transitions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use bookline_api::{ApiResult, Envelope};
use bookline_core::{BookingRequest, BookingStatus};

use crate::extract::Principal;
use crate::services::BookingDraft;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: BookingStatus,
}

pub async fn create(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Json(draft): Json<BookingDraft>,
) -> ApiResult<impl IntoResponse> {
    let ctx = state.identities.caller_context(user_id).await?;
    let booking = state.bookings.create(&ctx, draft).await?;
    Ok((StatusCode::CREATED, Envelope::ok(booking)))
}

pub async fn index(
    State(state): State<AppState>,
    Principal(user_id): Principal,
) -> ApiResult<Envelope<Vec<BookingRequest>>> {
    let ctx = state.identities.caller_context(user_id).await?;
    let bookings = state.bookings.index(&ctx).await?;
    Ok(Envelope::ok(bookings))
}

pub async fn show(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Path(booking_id): Path<Uuid>,
) -> ApiResult<Envelope<BookingRequest>> {
    let ctx = state.identities.caller_context(user_id).await?;
    let booking = state.bookings.show(&ctx, booking_id).await?;
    Ok(Envelope::ok(booking))
}

pub async fn update_status(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Envelope<BookingRequest>> {
    let ctx = state.identities.caller_context(user_id).await?;
    let booking = state
        .bookings
        .update_status(&ctx, booking_id, body.status)
        .await?;
    Ok(Envelope::ok(booking))
}
