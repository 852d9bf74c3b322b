//! Channel subscription endpoint: a server-sent-events stream over the
//! in-process broadcast transport.
//!
//! Unknown channel names are a 404 before any authorization check;
//! authorization follows the per-channel rules of the notify layer.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use bookline_api::{ApiError, ApiResult};
use bookline_core::Channel;
use bookline_notify::can_subscribe;

use crate::extract::Principal;
use crate::state::AppState;

pub async fn subscribe(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Path(name): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let channel = Channel::parse(&name)
        .ok_or_else(|| ApiError::not_found(format!("unknown channel: {name}")))?;
    let ctx = state.identities.caller_context(user_id).await?;
    if !can_subscribe(&channel, &ctx, state.access.as_ref()).await {
        return Err(ApiError::forbidden("channel.not_authorized"));
    }

    debug!(channel = %name, identity_id = %ctx.identity_id, "channel subscribed");
    let receiver = state.publisher.subscribe(&channel).await;
    let stream = futures_util::stream::unfold(receiver, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(message) => match Event::default()
                    .event(message.channel)
                    .json_data(&message.payload)
                {
                    Ok(event) => return Some((Ok(event), rx)),
                    Err(_) => continue,
                },
                // Slow consumer: skip what the buffer dropped and go on.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
