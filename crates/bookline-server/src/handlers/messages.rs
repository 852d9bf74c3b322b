//! Messaging endpoints: sending, thread listing, reads, and soft
//! deletion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use bookline_api::{ApiResult, Envelope};
use bookline_core::Message;

use crate::extract::Principal;
use crate::services::ThreadSummary;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendBody {
    pub recipient_id: Uuid,
    pub body: String,
}

pub async fn send(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Json(body): Json<SendBody>,
) -> ApiResult<impl IntoResponse> {
    let ctx = state.identities.caller_context(user_id).await?;
    let message = state
        .messaging
        .send(&ctx, body.recipient_id, body.body)
        .await?;
    Ok((StatusCode::CREATED, Envelope::ok(message)))
}

pub async fn threads(
    State(state): State<AppState>,
    Principal(user_id): Principal,
) -> ApiResult<Envelope<Vec<ThreadSummary>>> {
    let ctx = state.identities.caller_context(user_id).await?;
    let threads = state.messaging.threads(&ctx).await?;
    Ok(Envelope::ok(threads))
}

pub async fn thread_messages(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<Envelope<Vec<Message>>> {
    let ctx = state.identities.caller_context(user_id).await?;
    let messages = state.messaging.messages(&ctx, thread_id).await?;
    Ok(Envelope::ok(messages))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let ctx = state.identities.caller_context(user_id).await?;
    state.messaging.mark_read(&ctx, thread_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Path(message_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let ctx = state.identities.caller_context(user_id).await?;
    state.messaging.delete_message(&ctx, message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
