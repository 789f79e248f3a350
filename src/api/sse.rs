//! Server-Sent Events support

use crate::runtime::UiEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init_event: UiEvent,
    broadcast_rx: tokio::sync::broadcast::Receiver<UiEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Create stream that starts with init event then broadcasts
    let init = futures::stream::once(async move { Ok(ui_event_to_axum(init_event)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(ui_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn ui_event_to_axum(event: UiEvent) -> Event {
    let (event_type, data) = ui_event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}

fn ui_event_payload(event: UiEvent) -> (&'static str, serde_json::Value) {
    match event {
        UiEvent::Init { snapshot } => (
            "init",
            json!({
                "type": "init",
                "session": snapshot
            }),
        ),
        UiEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "rendered": message.render(),
                "message": message
            }),
        ),
        UiEvent::Reveal { chunk } => (
            "reveal",
            json!({
                "type": "reveal",
                "content": chunk.content,
                "timestamp": chunk.timestamp.format(crate::session::TIMESTAMP_FORMAT).to_string()
            }),
        ),
        UiEvent::Working { running } => (
            "working",
            json!({
                "type": "working",
                "running": running
            }),
        ),
        UiEvent::Notice { level, message } => (
            "notice",
            json!({
                "type": "notice",
                "level": level,
                "message": message
            }),
        ),
    }
}
