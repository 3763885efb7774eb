//! HTTP API のリクエスト / レスポンス DTO

use serde::{Deserialize, Serialize};

use crate::domain::{MessageKind, RoomKind};

/// エラー応答
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// ルームの応答 DTO
#[derive(Debug, Clone, Serialize)]
pub struct RoomDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: RoomKind,
    pub creator_id: Option<String>,
    /// 名前順にソート済みの参加者 ID
    pub participant_ids: Vec<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// メッセージの応答 DTO（送信者の表示名で装飾済み）
#[derive(Debug, Clone, Serialize)]
pub struct MessageDto {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub kind: MessageKind,
    pub content: String,
    pub sent_at: String,
    pub read: bool,
    pub read_at: Option<String>,
}

/// 最新メッセージと未読数で装飾したルームの応答 DTO
#[derive(Debug, Serialize)]
pub struct RoomOverviewDto {
    #[serde(flatten)]
    pub room: RoomDto,
    pub last_message: Option<MessageDto>,
    pub unread_count: u64,
}

/// メッセージのページ応答
#[derive(Debug, Serialize)]
pub struct MessagePageDto {
    pub messages: Vec<MessageDto>,
    /// 続きがある場合の次ページトークン
    pub next_page_token: Option<String>,
}

/// 未読数の応答
#[derive(Debug, Serialize)]
pub struct UnreadCountDto {
    pub unread_count: u64,
}

/// 全既読化の応答
#[derive(Debug, Serialize)]
pub struct MarkAllReadDto {
    /// 新たに既読になったメッセージ数
    pub marked_count: u64,
}

/// ルーム作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub description: Option<String>,
    /// 省略時は GROUP
    pub kind: Option<RoomKind>,
    pub creator_id: String,
    #[serde(default)]
    pub participant_ids: Vec<String>,
}

/// ルーム更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateRoomRequest {
    pub name: String,
    pub description: Option<String>,
}

/// 参加者追加リクエスト
#[derive(Debug, Deserialize)]
pub struct AddParticipantsRequest {
    pub participant_ids: Vec<String>,
}

/// メッセージ送信リクエスト
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: String,
    /// 省略時は TEXT
    pub kind: Option<MessageKind>,
    pub content: String,
}
