//! HTTP handlers: metrics scrape, health check, index page.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Json, Response};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use tracing::error;

use crate::state::AppState;

/// Prometheus scrape endpoint.
///
/// Rate limiting gates admission before any collection work happens; a
/// denial is a distinct 429, never a silent drop. One admitted request
/// triggers exactly one collection pass over the configured status files.
pub(crate) async fn handle_metrics(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let client_id = client_id(&headers, peer);
    if !state.limiter.check(&client_id, Instant::now()).is_admitted() {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Rate limit exceeded" })),
        )
            .into_response();
    }

    // Collection does synchronous file I/O by design (small, size-capped,
    // local files); keep it off the async workers anyway.
    let result = tokio::task::spawn_blocking(move || {
        state.collector.collect();

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&state.collector.metrics().gather(), &mut buffer)
            .map(|_| (encoder.format_type().to_string(), buffer))
    })
    .await;

    match result {
        Ok(Ok((content_type, body))) => {
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Ok(Err(e)) => {
            error!(error = %e, "metrics encoding failed");
            internal_error()
        }
        Err(e) => {
            error!(error = %e, "collection task failed");
            internal_error()
        }
    }
}

pub(crate) async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": openvpn_exporter_core::VERSION,
    }))
}

pub(crate) async fn handle_index() -> Html<&'static str> {
    Html(
        "<html>\
         <head><title>OpenVPN Exporter</title></head>\
         <body>\
         <h1>OpenVPN Exporter</h1>\
         <p><a href=\"/metrics\">Metrics</a></p>\
         <p><a href=\"/health\">Health</a></p>\
         </body>\
         </html>",
    )
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

/// Rate-limit identity: first `X-Forwarded-For` hop when present (the
/// exporter usually sits behind a scraping proxy), else the peer address.
fn client_id(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "10.0.0.1:55555".parse().unwrap()
    }

    #[test]
    fn test_client_id_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        assert_eq!(client_id(&headers, peer()), "203.0.113.9");
    }

    #[test]
    fn test_client_id_falls_back_to_peer() {
        assert_eq!(client_id(&HeaderMap::new(), peer()), "10.0.0.1");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "".parse().unwrap());
        assert_eq!(client_id(&headers, peer()), "10.0.0.1");
    }
}
