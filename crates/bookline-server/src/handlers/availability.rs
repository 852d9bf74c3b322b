//! Availability endpoints, all scoped to the caller's current identity.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use bookline_api::{ApiResult, Envelope};
use bookline_core::{AvailabilityPatch, AvailabilityRule, PresenceStatus};

use crate::extract::Principal;
use crate::services::RuleDraft;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BulkBody {
    pub rules: Vec<RuleDraft>,
}

#[derive(Debug, Deserialize)]
pub struct PresenceBody {
    pub status: PresenceStatus,
}

pub async fn list(
    State(state): State<AppState>,
    Principal(user_id): Principal,
) -> ApiResult<Envelope<Vec<AvailabilityRule>>> {
    let ctx = state.identities.caller_context(user_id).await?;
    let rules = state.availability.list(&ctx).await?;
    Ok(Envelope::ok(rules))
}

pub async fn create(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Json(draft): Json<RuleDraft>,
) -> ApiResult<impl IntoResponse> {
    let ctx = state.identities.caller_context(user_id).await?;
    let rule = state.availability.create(&ctx, draft).await?;
    Ok((StatusCode::CREATED, Envelope::ok(rule)))
}

pub async fn update(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Path(rule_id): Path<Uuid>,
    Json(patch): Json<AvailabilityPatch>,
) -> ApiResult<Envelope<AvailabilityRule>> {
    let ctx = state.identities.caller_context(user_id).await?;
    let rule = state.availability.update(&ctx, rule_id, patch).await?;
    Ok(Envelope::ok(rule))
}

pub async fn delete(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Path(rule_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let ctx = state.identities.caller_context(user_id).await?;
    state.availability.delete(&ctx, rule_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Json(body): Json<BulkBody>,
) -> ApiResult<Envelope<Vec<AvailabilityRule>>> {
    let ctx = state.identities.caller_context(user_id).await?;
    let rules = state.availability.replace_all(&ctx, body.rules).await?;
    Ok(Envelope::ok_with_message(rules, "availability replaced"))
}

pub async fn presence(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Json(body): Json<PresenceBody>,
) -> ApiResult<Envelope<PresenceStatus>> {
    let ctx = state.identities.caller_context(user_id).await?;
    state.availability.set_presence(&ctx, body.status).await?;
    Ok(Envelope::ok_with_message(body.status, "presence updated"))
}
