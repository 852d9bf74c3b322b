//! Identity endpoints: listing, creation, switching, removal, and the
//! switch audit trail.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use bookline_api::{ApiResult, Envelope};
use bookline_core::{Identity, IdentityRole, IdentitySwitchRecord, IdentityVisibility};

use crate::extract::Principal;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateIdentityBody {
    pub alias: String,
    pub role: IdentityRole,
    pub visibility: IdentityVisibility,
}

#[derive(Debug, Deserialize)]
pub struct SwitchBody {
    pub identity_id: Uuid,
}

pub async fn list(
    State(state): State<AppState>,
    Principal(user_id): Principal,
) -> ApiResult<Envelope<Vec<Identity>>> {
    let identities = state.identities.list(user_id).await?;
    Ok(Envelope::ok(identities))
}

pub async fn create(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Json(body): Json<CreateIdentityBody>,
) -> ApiResult<impl IntoResponse> {
    let identity = state
        .identities
        .create(user_id, body.alias, body.role, body.visibility)
        .await?;
    Ok((StatusCode::CREATED, Envelope::ok(identity)))
}

pub async fn switch(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Json(body): Json<SwitchBody>,
) -> ApiResult<Envelope<Identity>> {
    let identity = state.identities.switch(user_id, body.identity_id).await?;
    Ok(Envelope::ok_with_message(identity, "identity switched"))
}

pub async fn delete(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Path(identity_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.identities.delete(user_id, identity_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn history(
    State(state): State<AppState>,
    Principal(user_id): Principal,
) -> ApiResult<Envelope<Vec<IdentitySwitchRecord>>> {
    let records = state.identities.switch_history(user_id).await?;
    Ok(Envelope::ok(records))
}
