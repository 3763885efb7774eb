//! WebSocket connection handlers.
//!
//! ルーム単位の購読エンドポイント。接続すると Broadcaster に購読登録
//! され、そのルームのライブイベント（message / typing / read）を
//! 受け取ります。クライアントからは send / typing / read フレームを
//! 受け付けます。
//!
//! 接続はあくまで「ライブ配信の購読」であり、ルームの参加者集合は
//! 変化しません（参加・退出は RoomManager の操作）。

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, MessageContent, MessageId, MessageKind, RoomId, UserId},
    infrastructure::dto::websocket::ClientFrame,
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let room_id = match RoomId::new(room_id) {
        Ok(id) => id,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };
    let user_id = match UserId::new(query.user_id.clone()) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Invalid user_id format: '{}'", query.user_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // 購読できるのはルームの参加者だけ
    let room = match state.room_manager.get_room(&room_id).await {
        Ok(room) => room,
        Err(_) => return Err(StatusCode::NOT_FOUND),
    };
    if !room.has_participant(&user_id) {
        tracing::warn!(
            "User '{}' is not a participant of room '{}', rejecting subscription",
            user_id.as_str(),
            room_id.as_str()
        );
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, user_id)))
}

/// Spawns a task that receives live events from the rx channel and pushes
/// them to the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, WsMessage>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if sender.send(WsMessage::Text(event.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room_id: RoomId, user_id: UserId) {
    let (sender, mut receiver) = socket.split();

    // この接続専用のチャンネルを作って購読登録
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = ConnectionId::generate();
    state
        .broadcaster
        .subscribe(room_id.clone(), connection_id.clone(), tx)
        .await;
    tracing::info!(
        "User '{}' subscribed to room '{}' (connection '{}')",
        user_id.as_str(),
        room_id.as_str(),
        connection_id.as_str()
    );

    // ライブイベントをこの接続に流すタスク
    let mut send_task = pusher_loop(rx, sender);

    // クライアントからのフレームを処理するタスク
    let state_clone = state.clone();
    let room_id_clone = room_id.clone();
    let user_id_clone = user_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match frame {
                WsMessage::Text(text) => {
                    handle_client_frame(&state_clone, &room_id_clone, &user_id_clone, &text).await;
                }
                WsMessage::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                WsMessage::Close(_) => {
                    tracing::info!("User '{}' requested close", user_id_clone.as_str());
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.broadcaster.unsubscribe(&room_id, &connection_id).await;
    tracing::info!(
        "User '{}' unsubscribed from room '{}'",
        user_id.as_str(),
        room_id.as_str()
    );
}

/// クライアントからの 1 フレームを処理する
///
/// 失敗は警告ログに留め、接続は維持する。
async fn handle_client_frame(state: &AppState, room_id: &RoomId, user_id: &UserId, text: &str) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Failed to parse client frame as JSON: {}", e);
            return;
        }
    };

    match frame {
        ClientFrame::Send { kind, content } => {
            let content = match MessageContent::new(content) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Invalid message content: {}", e);
                    return;
                }
            };
            if let Err(e) = state
                .message_service
                .send_message(
                    room_id,
                    user_id.clone(),
                    kind.unwrap_or(MessageKind::Text),
                    content,
                )
                .await
            {
                tracing::warn!("Failed to send message: {}", e);
            }
        }
        ClientFrame::Typing => {
            state.broadcaster.publish_typing(room_id, user_id).await;
        }
        ClientFrame::Read { message_id } => {
            let message_id = match MessageId::new(message_id) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Invalid message id in read frame: {}", e);
                    return;
                }
            };
            if let Err(e) = state.message_service.mark_read(&message_id, user_id).await {
                tracing::warn!("Failed to mark message as read: {}", e);
            }
        }
    }
}
