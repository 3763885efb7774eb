//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::domain::IdentityResolver;
use crate::usecase::{Broadcaster, MessageService, RoomManager};

use super::{
    handler::{
        http::{
            add_participants, count_unread, create_room, delete_message, delete_room,
            get_direct_room, get_latest_message, get_message, get_messages, get_messages_since,
            get_room, health_check, list_rooms, list_rooms_for_user, mark_all_read,
            mark_message_read, remove_participant, search_messages, search_rooms, send_message,
            update_room,
        },
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Chat backend server
///
/// This struct encapsulates the engine components and exposes them over
/// HTTP and WebSocket.
pub struct Server {
    /// RoomManager（ルーム管理のユースケース）
    room_manager: Arc<RoomManager>,
    /// MessageService（メッセージ処理のユースケース）
    message_service: Arc<MessageService>,
    /// Broadcaster（ライブ配信のユースケース）
    broadcaster: Arc<Broadcaster>,
    /// IdentityResolver（応答 DTO の表示名装飾）
    identity: Arc<dyn IdentityResolver>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        room_manager: Arc<RoomManager>,
        message_service: Arc<MessageService>,
        broadcaster: Arc<Broadcaster>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            room_manager,
            message_service,
            broadcaster,
            identity,
        }
    }

    /// Build the axum router over the shared application state
    fn router(state: Arc<AppState>) -> Router {
        Router::new()
            // WebSocket エンドポイント（ルーム単位の購読）
            .route("/ws/rooms/{room_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", post(create_room).get(list_rooms))
            .route("/api/rooms/search", get(search_rooms))
            .route("/api/rooms/direct", get(get_direct_room))
            .route("/api/rooms/user/{user_id}", get(list_rooms_for_user))
            .route(
                "/api/rooms/{room_id}",
                get(get_room).put(update_room).delete(delete_room),
            )
            .route(
                "/api/rooms/{room_id}/participants",
                post(add_participants),
            )
            .route(
                "/api/rooms/{room_id}/participants/{user_id}",
                axum::routing::delete(remove_participant),
            )
            .route(
                "/api/rooms/{room_id}/messages",
                post(send_message).get(get_messages),
            )
            .route("/api/rooms/{room_id}/messages/since", get(get_messages_since))
            .route("/api/rooms/{room_id}/messages/search", get(search_messages))
            .route("/api/rooms/{room_id}/messages/latest", get(get_latest_message))
            .route("/api/rooms/{room_id}/unread", get(count_unread))
            .route("/api/rooms/{room_id}/read", post(mark_all_read))
            .route(
                "/api/messages/{message_id}",
                get(get_message).delete(delete_message),
            )
            .route("/api/messages/{message_id}/read", post(mark_message_read))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Run the chat backend server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            room_manager: self.room_manager,
            message_service: self.message_service,
            broadcaster: self.broadcaster,
            identity: self.identity,
        });

        let app = Self::router(app_state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat backend listening on {}", listener.local_addr()?);
        tracing::info!("Subscribe to: ws://{}/ws/rooms/{{room_id}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
