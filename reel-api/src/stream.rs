use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::{Stream, StreamExt};
use reel_core::ShowtimeId;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::extract::PathParam;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/showtimes/{id}/stream", get(showtime_stream))
}

/// Live seat updates for one showtime.
async fn showtime_stream(
    State(state): State<AppState>,
    PathParam(showtime_id): PathParam<ShowtimeId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    state.service.get_showtime(showtime_id).await?;
    debug!("SSE subscriber attached to showtime {}", showtime_id);

    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(move |received| async move {
        match received {
            Ok(event) if event.showtime_id() == showtime_id => Event::default()
                .event(event.name())
                .json_data(&event)
                .ok()
                .map(Ok::<_, Infallible>),
            Ok(_) => None,
            Err(lagged) => {
                warn!("SSE subscriber for showtime {} fell behind: {}", showtime_id, lagged);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
