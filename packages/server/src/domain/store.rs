//! ストア trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//! 順序付きで問い合わせ可能な永続ストアであれば何でも実装できます
//! （インメモリ、組み込み DB、リレーショナルテーブルなど）。

use async_trait::async_trait;

use super::{
    entity::{Message, Room},
    error::StoreError,
    value_object::{MessageContent, MessageId, MessageKind, RoomId, Timestamp, UserId},
};

/// Room ストア trait
///
/// ルームレコードと参加者集合の永続化を担当します。
///
/// ## 一意性制約
///
/// `insert` は DIRECT ルームについて「同一の参加者ペアを持つ DIRECT
/// ルームは高々 1 つ」という制約をストア内のクリティカルセクションで
/// 強制し、違反時は `StoreError::DuplicateDirectRoom` を返します。
/// 呼び出し側はこのエラーを受けて再読込でリトライします。
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// ルームを新規保存する
    async fn insert(&self, room: Room) -> Result<Room, StoreError>;

    /// ルームを ID で取得する
    async fn get(&self, room_id: &RoomId) -> Result<Room, StoreError>;

    /// ルームを上書き保存する
    async fn update(&self, room: Room) -> Result<Room, StoreError>;

    /// ルームを削除する
    async fn delete(&self, room_id: &RoomId) -> Result<(), StoreError>;

    /// 全ルームを取得する（作成時刻順）
    async fn list_all(&self) -> Vec<Room>;

    /// 指定ユーザーが参加している全ルームを取得する（作成時刻順）
    async fn list_for_user(&self, user_id: &UserId) -> Vec<Room>;

    /// 指定ユーザーが作成した全ルームを取得する（作成時刻順）
    async fn list_for_creator(&self, creator_id: &UserId) -> Vec<Room>;

    /// ルーム名の部分一致検索（大文字小文字を区別しない）
    async fn search_by_name(&self, fragment: &str) -> Vec<Room>;

    /// 2 ユーザー間の DIRECT ルームを検索する（引数の順序は無関係）
    async fn find_direct_between(&self, user_a: &UserId, user_b: &UserId) -> Option<Room>;
}

/// 永続化前のメッセージ
///
/// `id` と `sent_at` はストアが採番するため持ちません。
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub kind: MessageKind,
    pub content: MessageContent,
}

/// Message ストア trait
///
/// ルームごとの追記型メッセージストレージ。時刻範囲・ID・本文の
/// 部分一致で問い合わせできます。
///
/// ## 順序保証
///
/// `append` は全順序の採番点です。同一ルームへの並行 append は
/// それぞれ異なる、厳密に増加する `sent_at` を受け取り、永続化が
/// 完了してから呼び出し元に返ります。
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// メッセージを追記し、ID と `sent_at` を採番して返す
    async fn append(&self, new_message: NewMessage) -> Result<Message, StoreError>;

    /// メッセージを ID で取得する
    async fn get(&self, message_id: &MessageId) -> Result<Message, StoreError>;

    /// 新しい順のページを取得する
    ///
    /// `before` を指定した場合、その時刻より前のメッセージのみを返す。
    async fn page(
        &self,
        room_id: &RoomId,
        limit: usize,
        before: Option<Timestamp>,
    ) -> Vec<Message>;

    /// 指定時刻より後のメッセージを古い順で取得する
    async fn since(&self, room_id: &RoomId, after: Timestamp) -> Vec<Message>;

    /// ルームの最新メッセージを取得する
    async fn latest(&self, room_id: &RoomId) -> Option<Message>;

    /// メッセージを既読にする（冪等、`read_at` はストアが採番）
    async fn mark_read(&self, message_id: &MessageId) -> Result<Message, StoreError>;

    /// 指定ユーザー以外が送った未読メッセージを全て既読にする
    ///
    /// # Returns
    ///
    /// 新たに既読になったメッセージ数
    async fn mark_all_read(&self, room_id: &RoomId, user_id: &UserId) -> usize;

    /// 指定ユーザーにとっての未読メッセージ数を数える
    /// （`sender_id != user_id` かつ未読のもの）
    async fn count_unread(&self, room_id: &RoomId, user_id: &UserId) -> usize;

    /// 本文の部分一致検索（大文字小文字を区別しない、古い順）
    async fn search_content(&self, room_id: &RoomId, fragment: &str) -> Vec<Message>;

    /// メッセージを削除する
    async fn delete(&self, message_id: &MessageId) -> Result<(), StoreError>;

    /// ルームの全メッセージを削除する（ルーム削除時のカスケード）
    ///
    /// # Returns
    ///
    /// 削除されたメッセージ数
    async fn delete_room(&self, room_id: &RoomId) -> usize;
}
