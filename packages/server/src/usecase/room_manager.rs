//! UseCase: ルーム管理
//!
//! ルームのライフサイクル（作成、参加者の増減、DIRECT ルームの重複排除、
//! 検索、削除）を担当します。参加者集合を書き換えるのはこの
//! コンポーネントだけです。
//!
//! ## DIRECT ルームの重複排除
//!
//! `get_or_create_direct_room` は同じペアに対する並行呼び出しでも
//! ルームが 2 つできないことを保証します。ストアの `insert` がペアの
//! 一意性制約を強制し、競合した側は再読込で勝った側のルームを返します
//! （リトライは内部で 1 回）。

use std::collections::HashSet;
use std::sync::Arc;

use idobata_shared::time::Clock;

use crate::domain::{
    ChatError, IdentityResolver, MessageContent, MessageKind, Room, RoomId, RoomKind, RoomStore,
    StoreError, Timestamp, UserId, display_name_or_fallback,
};

use super::message_service::MessageService;

/// DIRECT ルームの既定名（相手の表示名が解決できない場合）
const DIRECT_ROOM_NAME: &str = "Direct Chat";

/// DIRECT ルームの既定説明
const DIRECT_ROOM_DESCRIPTION: &str = "Direct chat between users";

/// ルーム管理のユースケース
pub struct RoomManager {
    /// Room ストア
    rooms: Arc<dyn RoomStore>,
    /// MessageService（参加・退出の SYSTEM メッセージ発行とカスケード削除）
    messages: Arc<MessageService>,
    /// IdentityResolver（DIRECT ルーム名と SYSTEM メッセージの表示名）
    identity: Arc<dyn IdentityResolver>,
    /// Clock（ルームのタイムスタンプ採番）
    clock: Arc<dyn Clock>,
}

impl RoomManager {
    /// 新しい RoomManager を作成
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        messages: Arc<MessageService>,
        identity: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            messages,
            identity,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_utc_millis())
    }

    /// ルームを作成する
    ///
    /// 作成者は常に参加者に含まれます。
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - DIRECT ルームで参加者がちょうど 2 人にならない
    pub async fn create_room(
        &self,
        name: String,
        description: Option<String>,
        kind: RoomKind,
        creator_id: UserId,
        initial_participant_ids: Vec<UserId>,
    ) -> Result<Room, ChatError> {
        tracing::info!(
            "Creating {:?} room '{}' for creator: {}",
            kind,
            name,
            creator_id.as_str()
        );

        let mut participants: HashSet<UserId> = initial_participant_ids.into_iter().collect();
        participants.insert(creator_id.clone());

        if kind == RoomKind::Direct && participants.len() != 2 {
            return Err(ChatError::InvalidArgument(format!(
                "a direct room must have exactly 2 participants (got {})",
                participants.len()
            )));
        }

        let room = Room::new(
            RoomId::generate(),
            name,
            description,
            kind,
            Some(creator_id),
            participants,
            self.now(),
        );

        match self.rooms.insert(room).await {
            Ok(room) => Ok(room),
            // 同一ペアの DIRECT ルームが同時に作られた場合は勝った側を返す
            Err(StoreError::DuplicateDirectRoom { existing }) => {
                tracing::debug!(
                    "Direct room already exists, returning existing room: {}",
                    existing.as_str()
                );
                Ok(self.rooms.get(&existing).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// ルームを ID で取得する
    pub async fn get_room(&self, room_id: &RoomId) -> Result<Room, ChatError> {
        tracing::info!("Getting chat room by id: {}", room_id.as_str());

        Ok(self.rooms.get(room_id).await?)
    }

    /// 全ルームを取得する
    pub async fn list_all_rooms(&self) -> Vec<Room> {
        tracing::info!("Getting all chat rooms");

        self.rooms.list_all().await
    }

    /// 指定ユーザーが参加している全ルームを取得する
    pub async fn list_rooms_for_user(&self, user_id: &UserId) -> Vec<Room> {
        tracing::info!("Getting chat rooms for user: {}", user_id.as_str());

        self.rooms.list_for_user(user_id).await
    }

    /// 指定ユーザーが作成した全ルームを取得する
    pub async fn list_rooms_for_creator(&self, creator_id: &UserId) -> Vec<Room> {
        tracing::info!("Getting chat rooms created by user: {}", creator_id.as_str());

        self.rooms.list_for_creator(creator_id).await
    }

    /// ルーム名の部分一致検索（大文字小文字を区別しない）
    pub async fn search_rooms_by_name(&self, name: &str) -> Vec<Room> {
        tracing::info!("Searching chat rooms by name: {}", name);

        self.rooms.search_by_name(name).await
    }

    /// ルームの名前と説明を更新する
    pub async fn update_room(
        &self,
        room_id: &RoomId,
        name: String,
        description: Option<String>,
    ) -> Result<Room, ChatError> {
        tracing::info!("Updating chat room {}", room_id.as_str());

        let mut room = self.rooms.get(room_id).await?;
        room.name = name;
        room.description = description;
        room.updated_at = Some(self.now());

        Ok(self.rooms.update(room).await?)
    }

    /// 参加者を追加する（冪等な集合和）
    ///
    /// 新規に追加された参加者ごとに SYSTEM メッセージを発行します。
    ///
    /// # Errors
    ///
    /// * `NotFound` - ルームが存在しない
    /// * `InvalidState` - DIRECT ルームに 3 人目を追加しようとした
    pub async fn add_participants(
        &self,
        room_id: &RoomId,
        user_ids: Vec<UserId>,
    ) -> Result<Room, ChatError> {
        tracing::info!("Adding participants to room: {}", room_id.as_str());

        let mut room = self.rooms.get(room_id).await?;

        let mut newcomers: Vec<UserId> = Vec::new();
        for user_id in user_ids {
            if !room.has_participant(&user_id) && !newcomers.contains(&user_id) {
                newcomers.push(user_id);
            }
        }

        // 既存参加者のみの追加は no-op（冪等）
        if newcomers.is_empty() {
            return Ok(room);
        }

        if room.is_direct() {
            return Err(ChatError::InvalidState(
                "a direct room always has exactly 2 participants".to_string(),
            ));
        }

        for user_id in &newcomers {
            room.add_participant(user_id.clone());
        }
        room.updated_at = Some(self.now());
        let room = self.rooms.update(room).await?;

        for user_id in &newcomers {
            self.emit_membership_message(room_id, user_id, "joined").await;
        }

        Ok(room)
    }

    /// 参加者を削除する
    ///
    /// 最後の参加者が抜けた場合、ルームと全メッセージを削除して
    /// `None` を返します。
    ///
    /// # Errors
    ///
    /// * `NotFound` - ルームが存在しない
    /// * `InvalidArgument` - 参加していないユーザーを削除しようとした
    pub async fn remove_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<Option<Room>, ChatError> {
        tracing::info!(
            "Removing participant: {} from room: {}",
            user_id.as_str(),
            room_id.as_str()
        );

        let mut room = self.rooms.get(room_id).await?;
        if !room.remove_participant(user_id) {
            return Err(ChatError::InvalidArgument(
                "User is not a participant of this chat room".to_string(),
            ));
        }

        // 参加者がいなくなったらルームを削除（メッセージもカスケード）
        if room.is_empty() {
            self.messages.delete_all_for_room(&room.id).await;
            self.rooms.delete(&room.id).await?;
            tracing::info!("Deleted empty room: {}", room.id.as_str());
            return Ok(None);
        }

        room.updated_at = Some(self.now());
        let room = self.rooms.update(room).await?;

        self.emit_membership_message(room_id, user_id, "left").await;

        Ok(Some(room))
    }

    /// 2 ユーザー間の DIRECT ルームを取得し、無ければ作成する
    ///
    /// 引数の順序は無関係で、同じペアに対して常に同じルームを返します。
    /// 並行呼び出しで作成が競合した場合はストアの一意性制約が片方を
    /// 弾き、負けた側は勝った側のルームを再読込して返します。
    pub async fn get_or_create_direct_room(
        &self,
        user_a: &UserId,
        user_b: &UserId,
    ) -> Result<Room, ChatError> {
        tracing::info!(
            "Getting or creating direct chat room between users {} and {}",
            user_a.as_str(),
            user_b.as_str()
        );

        if user_a == user_b {
            return Err(ChatError::InvalidArgument(
                "a direct room requires two distinct users".to_string(),
            ));
        }

        if let Some(room) = self.rooms.find_direct_between(user_a, user_b).await {
            return Ok(room);
        }

        // 相手の表示名をルーム名に使う（解決できなければ既定名）
        let name = match self.identity.resolve_display_name(user_b).await {
            Ok(name) => name,
            Err(e) => {
                tracing::error!("Error fetching user info: {}", e);
                DIRECT_ROOM_NAME.to_string()
            }
        };

        let participants: HashSet<UserId> = [user_a.clone(), user_b.clone()].into_iter().collect();
        let room = Room::new(
            RoomId::generate(),
            name,
            Some(DIRECT_ROOM_DESCRIPTION.to_string()),
            RoomKind::Direct,
            None,
            participants,
            self.now(),
        );

        match self.rooms.insert(room).await {
            Ok(room) => Ok(room),
            Err(StoreError::DuplicateDirectRoom { existing }) => {
                tracing::debug!(
                    "Lost direct room creation race, returning winner: {}",
                    existing.as_str()
                );
                Ok(self.rooms.get(&existing).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// ルームを削除する（全メッセージをカスケード削除）
    pub async fn delete_room(&self, room_id: &RoomId) -> Result<(), ChatError> {
        tracing::info!("Deleting chat room {}", room_id.as_str());

        let room = self.rooms.get(room_id).await?;
        self.messages.delete_all_for_room(&room.id).await;
        self.rooms.delete(&room.id).await?;
        Ok(())
    }

    /// 参加・退出を記録する SYSTEM メッセージを発行する
    ///
    /// 参加者集合の変更は既に永続化済みのため、発行に失敗しても
    /// 操作自体は失敗させず、ログに記録して続行します。
    async fn emit_membership_message(&self, room_id: &RoomId, user_id: &UserId, verb: &str) {
        let name = display_name_or_fallback(self.identity.as_ref(), user_id).await;
        let content = match MessageContent::new(format!("{} {} the room", name, verb)) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to build membership message: {}", e);
                return;
            }
        };

        if let Err(e) = self
            .messages
            .send_message(room_id, UserId::system(), MessageKind::System, content)
            .await
        {
            tracing::warn!(
                "Failed to emit membership message for room '{}': {}",
                room_id.as_str(),
                e
            );
        }
    }
}
