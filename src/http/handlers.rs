//! Axum HTTP handlers for the web server
//!
//! Provides the session-bound Model Context Protocol endpoints (streaming and
//! legacy event-stream) and general metadata endpoints. Session lifecycle rules:
//! a streaming session opens only once `initialize` succeeded, closes on
//! `DELETE /mcp`; a legacy session opens eagerly on `GET /sse` and closes when
//! the stream drops. Any other request must name a known session or is
//! rejected with a 400 before anything is allocated.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::mcp::rpc::{is_json_rpc_error, json_rpc_error};
use crate::mcp::server::handle_json_rpc_value;
use crate::mcp::session::{Session, SessionEvent, SessionGuard};
use crate::AppState;

pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EndpointMap {
    pub mcp: &'static str,
    pub sse: &'static str,
    pub messages: &'static str,
    pub health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServiceDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: EndpointMap,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
    })
}

pub async fn descriptor() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        endpoints: EndpointMap {
            mcp: "/mcp",
            sse: "/sse",
            messages: "/messages",
            health: "/health",
        },
    })
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn with_session_header(mut response: Response, session_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(MCP_SESSION_ID_HEADER), value);
    }
    response
}

fn is_initialize_request(payload: &Value) -> bool {
    payload.get("method").and_then(Value::as_str) == Some("initialize")
}

async fn dispatch_payload(state: &AppState, payload: Value) -> Response {
    if let Some(batch) = payload.as_array() {
        if batch.is_empty() {
            return (
                StatusCode::OK,
                Json(vec![json_rpc_error(None, -32600, "Invalid Request")]),
            )
                .into_response();
        }

        let mut responses = Vec::new();
        for item in batch {
            if let Some(response) = handle_json_rpc_value(state, item.clone()).await {
                responses.push(response);
            }
        }

        if responses.is_empty() {
            return StatusCode::NO_CONTENT.into_response();
        }

        return (StatusCode::OK, Json(Value::Array(responses))).into_response();
    }

    match handle_json_rpc_value(state, payload).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// POST /mcp. Without a session header only `initialize` is accepted; the
/// session is registered after the handshake succeeded, never before.
pub async fn mcp_post(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return (
                StatusCode::OK,
                Json(json_rpc_error(None, -32700, "Parse error")),
            )
                .into_response()
        }
    };

    match session_id_from_headers(&headers) {
        Some(session_id) => {
            if !state.sessions.contains(&session_id).await {
                return AppError::bad_request(
                    "unknown_session",
                    "mcp-session-id does not match an open session",
                )
                .into_response();
            }
            let response = dispatch_payload(&state, payload).await;
            with_session_header(response, &session_id)
        }
        None => {
            if !is_initialize_request(&payload) {
                return AppError::bad_request(
                    "missing_session",
                    "mcp-session-id is required for requests other than initialize",
                )
                .into_response();
            }

            let Some(response) = handle_json_rpc_value(&state, payload).await else {
                return StatusCode::NO_CONTENT.into_response();
            };
            if is_json_rpc_error(&response) {
                return (StatusCode::OK, Json(response)).into_response();
            }

            let session_id = state.sessions.put(Session::new()).await;
            info!(session_id = %session_id, "mcp session opened");
            with_session_header((StatusCode::OK, Json(response)).into_response(), &session_id)
        }
    }
}

/// GET /mcp. Opens the server-to-client event stream of an existing session.
pub async fn mcp_get(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(session_id) = session_id_from_headers(&headers) else {
        return AppError::bad_request(
            "missing_session",
            "mcp-session-id is required to open the event stream",
        )
        .into_response();
    };

    let Some(receiver) = state.sessions.subscribe(&session_id).await else {
        return AppError::bad_request(
            "unknown_session",
            "mcp-session-id does not match an open session",
        )
        .into_response();
    };

    let stream = BroadcastStream::new(receiver).filter_map(|event| match event {
        Ok(SessionEvent::JsonRpc(json)) => {
            Some(Ok::<_, Infallible>(Event::default().event("message").data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response()
}

/// DELETE /mcp. The streaming transport's close signal.
pub async fn mcp_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(session_id) = session_id_from_headers(&headers) else {
        return AppError::bad_request(
            "missing_session",
            "mcp-session-id is required to close a session",
        )
        .into_response();
    };

    if state.sessions.remove(&session_id).await {
        info!(session_id = %session_id, "mcp session closed");
        StatusCode::NO_CONTENT.into_response()
    } else {
        AppError::bad_request(
            "unknown_session",
            "mcp-session-id does not match an open session",
        )
        .into_response()
    }
}

/// GET /sse. Legacy transport: the session is minted eagerly and announced to
/// the client through the `endpoint` event; dropping the stream removes it.
pub async fn sse_get(State(state): State<AppState>) -> Response {
    let session = Session::new();
    let receiver = session.subscribe();
    let session_id = state.legacy_sessions.put(session).await;
    info!(session_id = %session_id, "legacy session opened");

    let guard = SessionGuard::new(state.legacy_sessions.clone(), session_id.clone());
    let endpoint = tokio_stream::once(Ok::<_, Infallible>(
        Event::default()
            .event("endpoint")
            .data(format!("/messages?sessionId={session_id}")),
    ));
    let messages = BroadcastStream::new(receiver).filter_map(|event| match event {
        Ok(SessionEvent::JsonRpc(json)) => {
            Some(Ok::<_, Infallible>(Event::default().event("message").data(json)))
        }
        Err(_) => None,
    });
    let stream = endpoint.chain(messages).map(move |event| {
        let _hold = &guard;
        event
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response()
}

/// POST /messages. Routes a client message into an existing legacy session;
/// the JSON-RPC response travels back over that session's event stream.
pub async fn messages_post(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
    body: Bytes,
) -> Response {
    if !state.legacy_sessions.contains(&query.session_id).await {
        return AppError::bad_request(
            "unknown_session",
            "sessionId does not match an open event stream",
        )
        .into_response();
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return AppError::bad_request("invalid_json", "message body is not valid JSON")
                .into_response()
        }
    };

    if let Some(response) = handle_json_rpc_value(&state, payload).await {
        let delivered = state
            .legacy_sessions
            .send(&query.session_id, SessionEvent::JsonRpc(response.to_string()))
            .await;
        if !delivered {
            warn!(session_id = %query.session_id, "no open event stream for response");
        }
    }

    StatusCode::ACCEPTED.into_response()
}
