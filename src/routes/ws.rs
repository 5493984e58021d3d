//! # 실시간 이벤트 WebSocket
//!
//! `GET /api/v1/ws?token=<access token>`
//!
//! 연결한 사용자 대상 이벤트와 전체 공지 이벤트를 `{ "event": ..., "payload": ... }` 형태로 보냅니다.
//! 클라이언트가 보내는 메시지는 무시합니다.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::{
    middleware::auth::authenticate,
    services::realtime::RealtimeEvent,
    state::AppState,
};

#[derive(Deserialize)]
pub struct WsParams {
    token: String,
}

/// 브라우저는 WebSocket 업그레이드 요청에 헤더를 붙일 수 없으므로 access 토큰을 쿼리로 받습니다.
pub async fn realtime_ws(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let user = match authenticate(&params.token, &state).await {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    let rx = state.realtime.subscribe();
    tracing::debug!("Realtime socket opened for {}", user.user_id);
    ws.on_upgrade(move |socket| handle_socket(socket, rx, user.user_id))
        .into_response()
}

async fn handle_socket(
    mut socket: WebSocket,
    mut rx: broadcast::Receiver<RealtimeEvent>,
    user_id: String,
) {
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !event.is_for(&user_id) {
                            continue;
                        }
                        if let Ok(text) = serde_json::to_string(&event) {
                            if socket.send(Message::Text(text.into())).await.is_err() {
                                break; // 연결 끊김
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Realtime socket for {} skipped {} events", user_id, skipped);
                        continue;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }

    tracing::debug!("Realtime socket closed for {}", user_id);
}
