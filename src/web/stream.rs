//! Server-Sent Events endpoint: one long-lived response per subscriber.

use crate::error::SystemError;
use crate::web::registry::Registration;
use crate::web::sink::{ChannelSink, EventSink};
use crate::web::state::{shutdown_requested, AppState};
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Build a subscriber id from the peer address and the connect time.
///
/// The nanosecond timestamp keeps ids distinct across reconnects from the
/// same address.
pub fn subscriber_id(peer: Option<SocketAddr>) -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    match peer {
        Some(addr) => format!("{}-{}", addr, nanos),
        None => format!("local-{}", nanos),
    }
}

/// `GET /sse`: register a subscriber and stream events until it disconnects.
pub async fn stream_handler(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Response {
    let (sink, body) = ChannelSink::channel(state.config.channel_capacity);
    let sink = Arc::new(sink);
    let client_id = subscriber_id(peer.map(|ConnectInfo(addr)| addr));

    let dyn_sink: Arc<dyn EventSink> = sink.clone();
    let registration =
        match Registration::register(state.registry.clone(), client_id.clone(), dyn_sink).await {
            Some(registration) => registration,
            None => {
                error!("{}", SystemError::unsupported_sink(client_id));
                return (StatusCode::INTERNAL_SERVER_ERROR, "SSE not supported").into_response();
            }
        };

    info!(
        "Client connected: {} (total: {})",
        client_id,
        state.registry.count().await
    );

    tokio::spawn(hold_until_closed(registration, sink, state));

    let mut response = Body::from_stream(body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

/// `OPTIONS /sse`: answer a CORS pre-flight without registering anything.
pub async fn preflight_handler() -> Response {
    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Cache-Control"),
    );
    response
}

/// Wait for the client to go away or for shutdown, then deregister.
///
/// Deregistration happens when `registration` drops, which also covers the
/// task being cancelled. Dropping the last sink handle ends the body.
async fn hold_until_closed(registration: Registration, sink: Arc<ChannelSink>, state: AppState) {
    tokio::select! {
        _ = sink.closed() => {}
        _ = shutdown_requested(state.shutdown.clone()) => {}
    }

    let client_id = registration.id().to_string();
    drop(registration);
    drop(sink);

    info!(
        "Client disconnected: {} (total: {})",
        client_id,
        state.registry.count().await
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_ids_are_unique_per_connect() {
        let peer: SocketAddr = "10.0.0.2:50000".parse().unwrap();
        let first = subscriber_id(Some(peer));
        std::thread::sleep(std::time::Duration::from_millis(1));
        let second = subscriber_id(Some(peer));

        assert!(first.starts_with("10.0.0.2:50000-"));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_preflight_headers() {
        let response = preflight_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["access-control-allow-methods"], "GET");
        assert_eq!(
            response.headers()["access-control-allow-headers"],
            "Cache-Control"
        );
    }
}
