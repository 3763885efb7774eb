//! InMemory Message ストア実装
//!
//! ルームごとの追記型 Vec をインメモリ DB として使用します。
//! `append` が全順序の採番点であり、単一の Mutex の中で
//! `sent_at = max(now, 直前のメッセージ + 1)` を採番することで、
//! 同一ルーム内の厳密な単調増加を保証します（クロックの分解能より
//! 速い並行送信でも順序が潰れない）。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use idobata_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    Message, MessageId, MessageStore, NewMessage, RoomId, StoreError, Timestamp, UserId,
};

#[derive(Default)]
struct Inner {
    /// room_id → 送信順のメッセージ列
    by_room: HashMap<String, Vec<Message>>,
    /// message_id → room_id（ID 引きの二次インデックス）
    room_index: HashMap<String, String>,
}

/// インメモリ Message ストア実装
pub struct InMemoryMessageStore {
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl InMemoryMessageStore {
    /// 新しい InMemoryMessageStore を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner::default()),
        }
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, new_message: NewMessage) -> Result<Message, StoreError> {
        let mut inner = self.inner.lock().await;

        let now = self.clock.now_utc_millis();
        let history = inner
            .by_room
            .entry(new_message.room_id.as_str().to_string())
            .or_default();
        let sent_at = match history.last() {
            Some(last) => now.max(last.sent_at.value() + 1),
            None => now,
        };

        let message = Message {
            id: MessageId::generate(),
            room_id: new_message.room_id,
            sender_id: new_message.sender_id,
            kind: new_message.kind,
            content: new_message.content,
            sent_at: Timestamp::new(sent_at),
            read: false,
            read_at: None,
        };
        history.push(message.clone());
        inner.room_index.insert(
            message.id.as_str().to_string(),
            message.room_id.as_str().to_string(),
        );

        Ok(message)
    }

    async fn get(&self, message_id: &MessageId) -> Result<Message, StoreError> {
        let inner = self.inner.lock().await;
        find_message(&inner, message_id).cloned()
    }

    async fn page(
        &self,
        room_id: &RoomId,
        limit: usize,
        before: Option<Timestamp>,
    ) -> Vec<Message> {
        let inner = self.inner.lock().await;
        let Some(history) = inner.by_room.get(room_id.as_str()) else {
            return Vec::new();
        };
        history
            .iter()
            .rev()
            .filter(|m| before.is_none_or(|cursor| m.sent_at < cursor))
            .take(limit)
            .cloned()
            .collect()
    }

    async fn since(&self, room_id: &RoomId, after: Timestamp) -> Vec<Message> {
        let inner = self.inner.lock().await;
        let Some(history) = inner.by_room.get(room_id.as_str()) else {
            return Vec::new();
        };
        history
            .iter()
            .filter(|m| m.sent_at > after)
            .cloned()
            .collect()
    }

    async fn latest(&self, room_id: &RoomId) -> Option<Message> {
        let inner = self.inner.lock().await;
        inner
            .by_room
            .get(room_id.as_str())
            .and_then(|history| history.last())
            .cloned()
    }

    async fn mark_read(&self, message_id: &MessageId) -> Result<Message, StoreError> {
        let read_at = Timestamp::new(self.clock.now_utc_millis());
        let mut inner = self.inner.lock().await;
        let message = find_message_mut(&mut inner, message_id)?;
        message.mark_as_read(read_at);
        Ok(message.clone())
    }

    async fn mark_all_read(&self, room_id: &RoomId, user_id: &UserId) -> usize {
        let read_at = Timestamp::new(self.clock.now_utc_millis());
        let mut inner = self.inner.lock().await;
        let Some(history) = inner.by_room.get_mut(room_id.as_str()) else {
            return 0;
        };
        let mut marked = 0;
        for message in history
            .iter_mut()
            .filter(|m| !m.read && m.sender_id != *user_id)
        {
            message.mark_as_read(read_at);
            marked += 1;
        }
        marked
    }

    async fn count_unread(&self, room_id: &RoomId, user_id: &UserId) -> usize {
        let inner = self.inner.lock().await;
        inner
            .by_room
            .get(room_id.as_str())
            .map_or(0, |history| {
                history
                    .iter()
                    .filter(|m| !m.read && m.sender_id != *user_id)
                    .count()
            })
    }

    async fn search_content(&self, room_id: &RoomId, fragment: &str) -> Vec<Message> {
        let needle = fragment.to_lowercase();
        let inner = self.inner.lock().await;
        let Some(history) = inner.by_room.get(room_id.as_str()) else {
            return Vec::new();
        };
        history
            .iter()
            .filter(|m| m.content.as_str().to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    async fn delete(&self, message_id: &MessageId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let room_key = inner
            .room_index
            .remove(message_id.as_str())
            .ok_or_else(|| StoreError::MessageNotFound(message_id.as_str().to_string()))?;
        if let Some(history) = inner.by_room.get_mut(&room_key) {
            history.retain(|m| m.id != *message_id);
        }
        Ok(())
    }

    async fn delete_room(&self, room_id: &RoomId) -> usize {
        let mut inner = self.inner.lock().await;
        let Some(history) = inner.by_room.remove(room_id.as_str()) else {
            return 0;
        };
        for message in &history {
            inner.room_index.remove(message.id.as_str());
        }
        history.len()
    }
}

fn find_message<'a>(inner: &'a Inner, message_id: &MessageId) -> Result<&'a Message, StoreError> {
    inner
        .room_index
        .get(message_id.as_str())
        .and_then(|room_key| inner.by_room.get(room_key))
        .and_then(|history| history.iter().find(|m| m.id == *message_id))
        .ok_or_else(|| StoreError::MessageNotFound(message_id.as_str().to_string()))
}

fn find_message_mut<'a>(
    inner: &'a mut Inner,
    message_id: &MessageId,
) -> Result<&'a mut Message, StoreError> {
    let room_key = inner
        .room_index
        .get(message_id.as_str())
        .cloned()
        .ok_or_else(|| StoreError::MessageNotFound(message_id.as_str().to_string()))?;
    inner
        .by_room
        .get_mut(&room_key)
        .and_then(|history| history.iter_mut().find(|m| m.id == *message_id))
        .ok_or_else(|| StoreError::MessageNotFound(message_id.as_str().to_string()))
}
