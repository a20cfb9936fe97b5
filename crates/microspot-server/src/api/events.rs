//! Server-sent events stream of realtime updates.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::api::AppState;
use crate::auth::require_user;
use crate::error::ApiError;

/// Open a per-user event stream.  Each realtime event becomes one SSE
/// message whose event name is `new-message` or `new-notification`.
pub async fn stream(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let user = require_user(&headers, &state).await?;
    let rx = state.events.subscribe(user.id).await;

    debug!(user = %user.id, "opened event stream");

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    match Event::default().event(event.name).json_data(&event.payload) {
                        Ok(sse) => return Some((Ok(sse), rx)),
                        // Unserializable payloads are skipped, not fatal.
                        Err(_) => continue,
                    }
                }
                // A lagged receiver lost old events; keep streaming new ones.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
