use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;

use crate::state::AppState;

/// Subscribes the caller to `subject`'s push channel and streams every
/// frame the subject router and push hub deliver (C9/C11) as SSE events
/// until the client disconnects, at which point the sink unsubscribes
/// itself on drop.
pub async fn subject_stream(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subject = subject.to_uppercase();
    let sink = state.hub.subscribe(&subject);

    let stream = async_stream::stream! {
        loop {
            match sink.recv().await {
                Some(frame) => {
                    let event_type = match &frame {
                        newsintel_common::PushFrame::Verdict { .. } => "verdict",
                        newsintel_common::PushFrame::MarketUpdate { .. } => "market_update",
                        newsintel_common::PushFrame::MetricsUpdate { .. } => "metrics_update",
                    };
                    match serde_json::to_string(&frame) {
                        Ok(json) => yield Ok(Event::default().event(event_type).data(json)),
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to serialize push frame, skipping");
                        }
                    }
                }
                None => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}
