//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::http::middleware::{bearer_token, verify_jwt};
use crate::util::rate_limit::SessionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};
use crate::ws::session::SESSION_BUFFER;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Access token; the `Authorization` header is used when absent
    pub token: Option<String>,
}

/// Authenticate, then upgrade. Bad tokens get a 401 before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let verified = match query.token.as_deref() {
        Some(token) => verify_jwt(token, &state.config.supabase_jwt_secret),
        None => bearer_token(&headers)
            .and_then(|token| verify_jwt(token, &state.config.supabase_jwt_secret)),
    };

    match verified {
        Ok(claims) => ws.on_upgrade(move |socket| handle_socket(socket, claims.sub, state)),
        Err(e) => {
            warn!(error = %e, "WebSocket auth failed");
            (StatusCode::UNAUTHORIZED, e.to_string()).into_response()
        }
    }
}

/// Drive one authenticated connection until either side closes
async fn handle_socket(socket: WebSocket, user_id: Uuid, state: AppState) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(SESSION_BUFFER);

    let session_id = state.matchmaking.connect(user_id, tx);
    state.sessions.send_to(
        session_id,
        &ServerMsg::Welcome {
            user_id,
            session_id,
            server_time: unix_millis(),
        },
    );

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = ws_sink.send(Message::Text(frame)).await {
                debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    let limiter = SessionRateLimiter::new();
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !limiter.check_input() {
                    warn!(session_id = %session_id, "Rate limited input message");
                    continue;
                }
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => dispatch(&state, session_id, msg),
                    Err(e) => {
                        debug!(session_id = %session_id, error = %e, "Unparseable client message")
                    }
                }
            }
            Ok(Message::Close(_)) => {
                debug!(session_id = %session_id, "Client initiated close");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    state.matchmaking.handle_disconnect(session_id);
    writer.abort();
    info!(user_id = %user_id, session_id = %session_id, "WebSocket connection closed");
}

fn dispatch(state: &AppState, session_id: Uuid, msg: ClientMsg) {
    match msg {
        ClientMsg::GameSearch { options } => state.matchmaking.handle_search(session_id, options),
        ClientMsg::GameJoin { room_id } => state.matchmaking.handle_join(session_id, room_id),
        ClientMsg::Move {
            direction,
            event_type,
            input_seq,
        } => state
            .matchmaking
            .handle_move(session_id, direction, event_type, input_seq),
        ClientMsg::Ping { t } => state.sessions.send_to(session_id, &ServerMsg::Pong { t }),
    }
}
