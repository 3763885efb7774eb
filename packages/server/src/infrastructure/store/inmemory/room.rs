//! InMemory Room ストア実装
//!
//! ドメイン層が定義する RoomStore trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! DIRECT ルームのペア一意性は、この実装では全操作を直列化する
//! 単一の Mutex で強制されます。DBMS 実装ではペアに対する一意
//! インデックスが同じ制約を担います。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Room, RoomId, RoomStore, StoreError, UserId};

/// インメモリ Room ストア実装
pub struct InMemoryRoomStore {
    /// room_id → Room
    rooms: Mutex<HashMap<String, Room>>,
}

impl InMemoryRoomStore {
    /// 新しい InMemoryRoomStore を作成
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// 作成時刻順（同時刻なら ID 順）にソートして返す
    fn sorted(mut rooms: Vec<Room>) -> Vec<Room> {
        rooms.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        rooms
    }
}

impl Default for InMemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn insert(&self, room: Room) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.lock().await;

        // DIRECT ルームのペア一意性制約（チェックと挿入は同一ロック内）
        if room.is_direct() {
            if let Some(existing) = rooms
                .values()
                .find(|r| r.is_direct() && r.participants == room.participants)
            {
                return Err(StoreError::DuplicateDirectRoom {
                    existing: existing.id.clone(),
                });
            }
        }

        rooms.insert(room.id.as_str().to_string(), room.clone());
        Ok(room)
    }

    async fn get(&self, room_id: &RoomId) -> Result<Room, StoreError> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::RoomNotFound(room_id.as_str().to_string()))
    }

    async fn update(&self, room: Room) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.lock().await;
        if !rooms.contains_key(room.id.as_str()) {
            return Err(StoreError::RoomNotFound(room.id.as_str().to_string()));
        }
        rooms.insert(room.id.as_str().to_string(), room.clone());
        Ok(room)
    }

    async fn delete(&self, room_id: &RoomId) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        rooms
            .remove(room_id.as_str())
            .map(|_| ())
            .ok_or_else(|| StoreError::RoomNotFound(room_id.as_str().to_string()))
    }

    async fn list_all(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        Self::sorted(rooms.values().cloned().collect())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        Self::sorted(
            rooms
                .values()
                .filter(|r| r.has_participant(user_id))
                .cloned()
                .collect(),
        )
    }

    async fn list_for_creator(&self, creator_id: &UserId) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        Self::sorted(
            rooms
                .values()
                .filter(|r| r.creator_id.as_ref() == Some(creator_id))
                .cloned()
                .collect(),
        )
    }

    async fn search_by_name(&self, fragment: &str) -> Vec<Room> {
        let needle = fragment.to_lowercase();
        let rooms = self.rooms.lock().await;
        Self::sorted(
            rooms
                .values()
                .filter(|r| r.name.to_lowercase().contains(&needle))
                .cloned()
                .collect(),
        )
    }

    async fn find_direct_between(&self, user_a: &UserId, user_b: &UserId) -> Option<Room> {
        let rooms = self.rooms.lock().await;
        rooms
            .values()
            .find(|r| {
                r.is_direct()
                    && r.participants.len() == 2
                    && r.has_participant(user_a)
                    && r.has_participant(user_b)
            })
            .cloned()
    }
}
