//! Conversion logic between domain entities and DTOs.

use idobata_shared::time::timestamp_to_rfc3339;

use crate::domain::{IdentityResolver, Message, Room, display_name_or_fallback};

use super::http::{MessageDto, RoomDto, RoomOverviewDto};

/// Room エンティティから応答 DTO への変換
pub fn to_room_dto(room: &Room) -> RoomDto {
    RoomDto {
        id: room.id.as_str().to_string(),
        name: room.name.clone(),
        description: room.description.clone(),
        kind: room.kind,
        creator_id: room.creator_id.as_ref().map(|id| id.as_str().to_string()),
        participant_ids: room
            .sorted_participants()
            .into_iter()
            .map(|id| id.into_string())
            .collect(),
        created_at: timestamp_to_rfc3339(room.created_at.value()),
        updated_at: room.updated_at.map(|ts| timestamp_to_rfc3339(ts.value())),
    }
}

/// Message エンティティから応答 DTO への変換
///
/// 送信者の表示名で装飾します（解決できなければプレースホルダ名）。
pub async fn to_message_dto(message: &Message, resolver: &dyn IdentityResolver) -> MessageDto {
    let sender_name = display_name_or_fallback(resolver, &message.sender_id).await;
    MessageDto {
        id: message.id.as_str().to_string(),
        room_id: message.room_id.as_str().to_string(),
        sender_id: message.sender_id.as_str().to_string(),
        sender_name,
        kind: message.kind,
        content: message.content.as_str().to_string(),
        sent_at: timestamp_to_rfc3339(message.sent_at.value()),
        read: message.read,
        read_at: message.read_at.map(|ts| timestamp_to_rfc3339(ts.value())),
    }
}

/// 最新メッセージと未読数で装飾したルーム DTO への変換
pub async fn to_room_overview_dto(
    room: &Room,
    last_message: Option<Message>,
    unread_count: usize,
    resolver: &dyn IdentityResolver,
) -> RoomOverviewDto {
    let last_message = match last_message {
        Some(message) => Some(to_message_dto(&message, resolver).await),
        None => None,
    };
    RoomOverviewDto {
        room: to_room_dto(room),
        last_message,
        unread_count: unread_count as u64,
    }
}
