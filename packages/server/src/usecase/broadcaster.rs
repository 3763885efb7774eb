//! UseCase: ライブ配信（ファンアウト）
//!
//! 永続化された新着メッセージと、永続化されないエフェメラルイベント
//! （タイピング通知、既読通知）を、ルームを購読中の全接続に配信します。
//!
//! ## 設計ノート
//!
//! 配信は永続化経路から切り離されたベストエフォートです。切断済み・
//! 遅延中の購読者が送信側をブロックしたり失敗させたりすることはなく、
//! 取りこぼしたイベントはクライアントが履歴クエリ（getSince）で
//! 追いつきます。購読状態（ルーム → 接続集合）はこのコンポーネントが
//! 所有する唯一の状態です。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, IdentityResolver, Message, MessageId, MessagePusher, PusherChannel, RoomId,
    UserId, display_name_or_fallback,
};

/// ライブイベントの種別タグ
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Message,
    Typing,
    Read,
}

/// 新着メッセージのイベントフレーム
#[derive(Debug, Serialize)]
pub struct MessageEvent {
    pub r#type: EventType,
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub kind: crate::domain::MessageKind,
    pub content: String,
    pub sent_at: i64,
}

/// タイピング通知のイベントフレーム（永続化されない）
#[derive(Debug, Serialize)]
pub struct TypingEvent {
    pub r#type: EventType,
    pub room_id: String,
    pub user_id: String,
}

/// 既読通知のイベントフレーム（永続化されない）
#[derive(Debug, Serialize)]
pub struct ReadEvent {
    pub r#type: EventType,
    pub room_id: String,
    pub message_id: String,
}

/// ライブ配信のユースケース
pub struct Broadcaster {
    /// MessagePusher（接続レジストリと送信処理の抽象化）
    pusher: Arc<dyn MessagePusher>,
    /// IdentityResolver（イベントフレームの表示名装飾に使用）
    identity: Arc<dyn IdentityResolver>,
    /// ルームごとの購読中接続集合
    subscriptions: Mutex<HashMap<RoomId, HashSet<ConnectionId>>>,
}

impl Broadcaster {
    /// 新しい Broadcaster を作成
    pub fn new(pusher: Arc<dyn MessagePusher>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self {
            pusher,
            identity,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// 接続をルームの購読者として登録する
    pub async fn subscribe(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) {
        self.pusher
            .register_connection(connection_id.clone(), sender)
            .await;

        let mut subscriptions = self.subscriptions.lock().await;
        subscriptions
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id.clone());
        tracing::debug!(
            "Connection '{}' subscribed to room '{}'",
            connection_id.as_str(),
            room_id.as_str()
        );
    }

    /// 接続の購読を解除する
    pub async fn unsubscribe(&self, room_id: &RoomId, connection_id: &ConnectionId) {
        {
            let mut subscriptions = self.subscriptions.lock().await;
            if let Some(connections) = subscriptions.get_mut(room_id) {
                connections.remove(connection_id);
                if connections.is_empty() {
                    subscriptions.remove(room_id);
                }
            }
        }
        self.pusher.unregister_connection(connection_id).await;
        tracing::debug!(
            "Connection '{}' unsubscribed from room '{}'",
            connection_id.as_str(),
            room_id.as_str()
        );
    }

    /// ルームの現在の購読者数を返す
    pub async fn subscriber_count(&self, room_id: &RoomId) -> usize {
        let subscriptions = self.subscriptions.lock().await;
        subscriptions.get(room_id).map_or(0, |c| c.len())
    }

    /// 永続化済みの新着メッセージを購読者全員に配信する
    ///
    /// 永続化が完了した後にのみ呼ばれます。配信はベストエフォートで、
    /// この呼び出しがエラーを返すことはありません。
    pub async fn publish_message(&self, message: &Message) {
        let sender_name =
            display_name_or_fallback(self.identity.as_ref(), &message.sender_id).await;
        let event = MessageEvent {
            r#type: EventType::Message,
            id: message.id.as_str().to_string(),
            room_id: message.room_id.as_str().to_string(),
            sender_id: message.sender_id.as_str().to_string(),
            sender_name,
            kind: message.kind,
            content: message.content.as_str().to_string(),
            sent_at: message.sent_at.value(),
        };
        self.fan_out(&message.room_id, &event).await;
    }

    /// タイピング通知を購読者全員に配信する（at-most-once、永続化なし）
    pub async fn publish_typing(&self, room_id: &RoomId, user_id: &UserId) {
        let event = TypingEvent {
            r#type: EventType::Typing,
            room_id: room_id.as_str().to_string(),
            user_id: user_id.as_str().to_string(),
        };
        self.fan_out(room_id, &event).await;
    }

    /// 既読通知を購読者全員に配信する（参考情報、ベストエフォート）
    pub async fn publish_read_notice(&self, room_id: &RoomId, message_id: &MessageId) {
        let event = ReadEvent {
            r#type: EventType::Read,
            room_id: room_id.as_str().to_string(),
            message_id: message_id.as_str().to_string(),
        };
        self.fan_out(room_id, &event).await;
    }

    /// イベントをシリアライズしてルームの購読者に流す
    async fn fan_out<T: Serialize>(&self, room_id: &RoomId, event: &T) {
        let payload = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize live event: {}", e);
                return;
            }
        };

        let targets: Vec<ConnectionId> = {
            let subscriptions = self.subscriptions.lock().await;
            match subscriptions.get(room_id) {
                Some(connections) => connections.iter().cloned().collect(),
                None => return,
            }
        };

        tracing::debug!(
            "Fanning out event to {} subscriber(s) of room '{}'",
            targets.len(),
            room_id.as_str()
        );
        self.pusher.broadcast(targets, &payload).await;
    }
}
