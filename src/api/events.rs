use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use std::{convert::Infallible, sync::Arc};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{debug, warn};

use crate::controller::{AppState, DashboardEvent};

/// GET /api/v1/events - current snapshot, then every change
pub async fn sse_handler(
    State(st): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = st.controller.subscribe();
    let initial = DashboardEvent::Snapshot(Arc::new(st.controller.snapshot().await));

    let updates = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(event) => Some(event),
        Err(e) => {
            debug!(error = %e, "event stream lagged");
            None
        }
    });

    let stream = tokio_stream::once(initial)
        .chain(updates)
        .filter_map(|event| to_sse(&event).map(Ok::<_, Infallible>));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_sse(event: &DashboardEvent) -> Option<Event> {
    let sse = Event::default().event(event.name());
    let encoded = match event {
        DashboardEvent::Snapshot(snapshot) => sse.json_data(snapshot.as_ref()),
        DashboardEvent::Alert(alert) => sse.json_data(alert),
    };
    encoded
        .map_err(|e| warn!(error = %e, "failed to encode dashboard event"))
        .ok()
}
