//! UseCase: メッセージ処理
//!
//! メッセージの作成・取得・検索、既読状態の遷移、未読集計を担当します。
//! メッセージの既読状態（`read` / `read_at`）を書き換えるのはこの
//! コンポーネントだけです。
//!
//! ## 整合性
//!
//! - 送信者の参加チェックは、送信時点での参加者集合のスナップショット
//!   （RoomStore から読み出した Room）に対して行う
//! - `sent_at` の採番と永続化は MessageStore の append が単一の
//!   クリティカルセクションで行い、永続化完了後に配信する
//! - 既読化は冪等であり、並行して同じメッセージを既読にしても
//!   同じ最終状態に収束する

use std::sync::Arc;

use crate::domain::{
    ChatError, Message, MessageContent, MessageId, MessageKind, MessageStore, NewMessage, RoomId,
    RoomStore, Timestamp, UserId,
};

use super::broadcaster::Broadcaster;

/// 1 ページの最大メッセージ数
pub const MAX_PAGE_SIZE: usize = 100;

/// メッセージ処理のユースケース
pub struct MessageService {
    /// Room ストア（参加チェックのための読み取り専用アクセス）
    rooms: Arc<dyn RoomStore>,
    /// Message ストア
    messages: Arc<dyn MessageStore>,
    /// Broadcaster（永続化後のライブ配信）
    broadcaster: Arc<Broadcaster>,
}

impl MessageService {
    /// 新しい MessageService を作成
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        messages: Arc<dyn MessageStore>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            rooms,
            messages,
            broadcaster,
        }
    }

    /// メッセージを送信する
    ///
    /// 送信者がルームの参加者であることを検証し、永続化してから
    /// 購読者に配信します。SYSTEM 送信者は参加チェックを通りません
    /// （参加・退出の合成メッセージのため）。
    ///
    /// # Errors
    ///
    /// * `NotFound` - ルームが存在しない
    /// * `Forbidden` - 送信者が参加者ではない
    pub async fn send_message(
        &self,
        room_id: &RoomId,
        sender_id: UserId,
        kind: MessageKind,
        content: MessageContent,
    ) -> Result<Message, ChatError> {
        tracing::info!(
            "Saving chat message to room: {} from user: {}",
            room_id.as_str(),
            sender_id.as_str()
        );

        let room = self.rooms.get(room_id).await?;
        if !sender_id.is_system() && !room.has_participant(&sender_id) {
            return Err(ChatError::Forbidden(
                "User is not a participant of this chat room".to_string(),
            ));
        }

        let message = self
            .messages
            .append(NewMessage {
                room_id: room_id.clone(),
                sender_id,
                kind,
                content,
            })
            .await?;

        // 永続化が完了してから配信する（配信はベストエフォート）
        self.broadcaster.publish_message(&message).await;

        Ok(message)
    }

    /// メッセージを新しい順でページ取得する
    ///
    /// `page_token` は前ページの末尾が返した不透明なカーソルで、
    /// 並行送信があってもページ境界は安定しています。
    ///
    /// # Returns
    ///
    /// メッセージ列（新しい順）と、続きがある場合の次ページトークン
    pub async fn get_page(
        &self,
        room_id: &RoomId,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<(Vec<Message>, Option<String>), ChatError> {
        tracing::info!("Getting chat messages for room: {}", room_id.as_str());

        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ChatError::InvalidArgument(format!(
                "page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        self.rooms.get(room_id).await?;

        let before = match page_token {
            None => None,
            Some(token) => {
                let millis: i64 = token.parse().map_err(|_| {
                    ChatError::InvalidArgument(format!("invalid page token: {}", token))
                })?;
                Some(Timestamp::new(millis))
            }
        };

        let messages = self.messages.page(room_id, page_size, before).await;
        let next_token = if messages.len() == page_size {
            messages.last().map(|m| m.sent_at.value().to_string())
        } else {
            None
        };

        Ok((messages, next_token))
    }

    /// 指定時刻より後のメッセージを古い順で取得する
    ///
    /// 再接続後のクライアントが、ライブ配信で取りこぼした分を
    /// 追いつくための経路です。
    pub async fn get_since(
        &self,
        room_id: &RoomId,
        after: Timestamp,
    ) -> Result<Vec<Message>, ChatError> {
        tracing::info!(
            "Getting messages for room: {} since: {}",
            room_id.as_str(),
            after.value()
        );

        self.rooms.get(room_id).await?;
        Ok(self.messages.since(room_id, after).await)
    }

    /// メッセージを ID で取得する
    pub async fn get_by_id(&self, message_id: &MessageId) -> Result<Message, ChatError> {
        tracing::info!("Getting message by id: {}", message_id.as_str());

        Ok(self.messages.get(message_id).await?)
    }

    /// メッセージを既読にする（冪等）
    ///
    /// 自分が送ったメッセージと既読済みのメッセージは no-op。
    /// 実際に状態が変わった場合のみ既読通知を配信します。
    pub async fn mark_read(
        &self,
        message_id: &MessageId,
        user_id: &UserId,
    ) -> Result<(), ChatError> {
        tracing::info!(
            "Marking message: {} as read by user: {}",
            message_id.as_str(),
            user_id.as_str()
        );

        let message = self.messages.get(message_id).await?;
        if message.sender_id == *user_id || message.read {
            return Ok(());
        }

        let updated = self.messages.mark_read(message_id).await?;
        self.broadcaster
            .publish_read_notice(&updated.room_id, &updated.id)
            .await;
        Ok(())
    }

    /// ルーム内の未読メッセージを全て既読にする
    ///
    /// `user_id` 以外が送った未読メッセージ全てに `mark_read` と
    /// 同じ遷移を適用します。
    ///
    /// # Returns
    ///
    /// 新たに既読になったメッセージ数
    pub async fn mark_all_read(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<usize, ChatError> {
        tracing::info!(
            "Marking all messages as read in room: {} by user: {}",
            room_id.as_str(),
            user_id.as_str()
        );

        self.rooms.get(room_id).await?;
        Ok(self.messages.mark_all_read(room_id, user_id).await)
    }

    /// 指定ユーザーにとっての未読メッセージ数を返す
    pub async fn count_unread(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<usize, ChatError> {
        tracing::info!(
            "Counting unread messages in room: {} for user: {}",
            room_id.as_str(),
            user_id.as_str()
        );

        self.rooms.get(room_id).await?;
        Ok(self.messages.count_unread(room_id, user_id).await)
    }

    /// ルームの最新メッセージを返す（メッセージが無ければ None）
    pub async fn get_latest(&self, room_id: &RoomId) -> Result<Option<Message>, ChatError> {
        self.rooms.get(room_id).await?;
        Ok(self.messages.latest(room_id).await)
    }

    /// 本文の部分一致でメッセージを検索する（大文字小文字を区別しない）
    pub async fn search_by_content(
        &self,
        room_id: &RoomId,
        keyword: &str,
    ) -> Result<Vec<Message>, ChatError> {
        tracing::info!(
            "Searching messages in room: {} with keyword: {}",
            room_id.as_str(),
            keyword
        );

        self.rooms.get(room_id).await?;
        Ok(self.messages.search_content(room_id, keyword).await)
    }

    /// メッセージを削除する
    pub async fn delete_message(&self, message_id: &MessageId) -> Result<(), ChatError> {
        tracing::info!("Deleting message: {}", message_id.as_str());

        Ok(self.messages.delete(message_id).await?)
    }

    /// ルームの全メッセージを削除する
    ///
    /// ルーム削除時のカスケードとして RoomManager から呼ばれます。
    /// ルーム本体は既に消えていることがあるため存在チェックはしません。
    pub async fn delete_all_for_room(&self, room_id: &RoomId) -> usize {
        let removed = self.messages.delete_room(room_id).await;
        tracing::info!(
            "Deleted {} message(s) for room: {}",
            removed,
            room_id.as_str()
        );
        removed
    }
}
