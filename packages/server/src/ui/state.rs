//! Server state shared across handlers.

use std::sync::Arc;

use crate::domain::IdentityResolver;
use crate::usecase::{Broadcaster, MessageService, RoomManager};

/// Shared application state
pub struct AppState {
    /// RoomManager（ルーム管理のユースケース）
    pub room_manager: Arc<RoomManager>,
    /// MessageService（メッセージ処理のユースケース）
    pub message_service: Arc<MessageService>,
    /// Broadcaster（ライブ配信のユースケース）
    pub broadcaster: Arc<Broadcaster>,
    /// IdentityResolver（応答 DTO の表示名装飾に使用）
    pub identity: Arc<dyn IdentityResolver>,
}
