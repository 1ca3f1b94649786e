use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;

use crate::sse::SubscriptionGuard;
use crate::state::AppState;

/// GET /api/events/{request_id}
///
/// Opens a server-sent event stream for one job. The first frame is always
/// `{"status":"CONNECTED"}`; later frames are normalized job events. The
/// stream ends after a terminal event, or when a newer connection for the
/// same job replaces this one.
///
/// In push mode frames come from the webhook. Otherwise a server-side poller
/// is started for the lifetime of the stream.
pub async fn events_handler(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let handle = state.registry.subscribe(&request_id).await;

    if !state.config.push_enabled() {
        state.pollers.spawn(
            request_id.clone(),
            handle.conn_id.clone(),
            Arc::clone(&state.provider),
            Arc::clone(&state.registry),
            state.config.poll.clone(),
        );
    }

    let guard = SubscriptionGuard::new(
        request_id,
        handle.conn_id,
        Arc::clone(&state.registry),
        Arc::clone(&state.pollers),
    );

    // The guard rides along in the stream state and drops with it.
    let stream = futures::stream::unfold(
        (handle.receiver, guard),
        |(mut receiver, guard)| async move {
            let frame = receiver.recv().await?;
            let event = Event::default().data(frame.to_json());
            Some((Ok(event), (receiver, guard)))
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}
