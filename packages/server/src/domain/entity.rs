//! エンティティ定義
//!
//! チャットエンジンが所有する 2 つのエンティティ（Room, Message）を
//! 定義します。参加者集合の書き込みは RoomManager、既読状態の書き込みは
//! MessageService だけが行います。

use std::collections::HashSet;

use serde::Serialize;

use super::value_object::{
    MessageContent, MessageId, MessageKind, RoomId, RoomKind, Timestamp, UserId,
};

/// チャットルーム
///
/// 参加者集合は順序を持たない ID の集合です。DIRECT ルームは作成後
/// 常にちょうど 2 人の参加者を持ちます。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: Option<String>,
    pub kind: RoomKind,
    /// ルーム作成者。DIRECT ルームはペア間の初回参照で暗黙に作られる
    /// ため作成者を持たないことがある。
    pub creator_id: Option<UserId>,
    pub participants: HashSet<UserId>,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

impl Room {
    pub fn new(
        id: RoomId,
        name: String,
        description: Option<String>,
        kind: RoomKind,
        creator_id: Option<UserId>,
        participants: HashSet<UserId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            name,
            description,
            kind,
            creator_id,
            participants,
            created_at,
            updated_at: None,
        }
    }

    /// 参加者を追加する（既に参加している場合は何もしない）
    pub fn add_participant(&mut self, user_id: UserId) {
        self.participants.insert(user_id);
    }

    /// 参加者を削除する
    ///
    /// # Returns
    ///
    /// 削除された場合 `true`、参加していなかった場合 `false`
    pub fn remove_participant(&mut self, user_id: &UserId) -> bool {
        self.participants.remove(user_id)
    }

    pub fn has_participant(&self, user_id: &UserId) -> bool {
        self.participants.contains(user_id)
    }

    pub fn is_direct(&self) -> bool {
        self.kind == RoomKind::Direct
    }

    /// 参加者集合が空かどうか（空の GROUP ルームは削除対象）
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// 名前順にソートした参加者 ID のリストを返す
    ///
    /// HashSet は列挙順が不定のため、応答の組み立てには必ずこちらを使う。
    pub fn sorted_participants(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.participants.iter().cloned().collect();
        ids.sort();
        ids
    }
}

/// チャットメッセージ
///
/// 本文は作成後に変更されない。可変なのは既読状態
/// （`read` / `read_at`）のみ。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub kind: MessageKind,
    pub content: MessageContent,
    /// 永続化時にストアが採番するタイムスタンプ。同一ルーム内で
    /// 厳密に単調増加する。
    pub sent_at: Timestamp,
    pub read: bool,
    pub read_at: Option<Timestamp>,
}

impl Message {
    /// メッセージを既読状態にする（冪等）
    pub fn mark_as_read(&mut self, read_at: Timestamp) {
        if !self.read {
            self.read = true;
            self.read_at = Some(read_at);
        }
    }

    pub fn is_system(&self) -> bool {
        self.sender_id.is_system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_room(kind: RoomKind, participants: &[&str]) -> Room {
        let set: HashSet<UserId> = participants
            .iter()
            .map(|id| UserId::new(id.to_string()).unwrap())
            .collect();
        Room::new(
            RoomId::generate(),
            "test room".to_string(),
            None,
            kind,
            None,
            set,
            Timestamp::new(1000),
        )
    }

    fn test_message(sender: &str) -> Message {
        Message {
            id: MessageId::generate(),
            room_id: RoomId::generate(),
            sender_id: UserId::new(sender.to_string()).unwrap(),
            kind: MessageKind::Text,
            content: MessageContent::new("hello".to_string()).unwrap(),
            sent_at: Timestamp::new(1000),
            read: false,
            read_at: None,
        }
    }

    #[test]
    fn test_add_participant_is_idempotent() {
        // テスト項目: 同じ参加者を二度追加しても集合が変わらない
        // given (前提条件):
        let mut room = test_room(RoomKind::Group, &["alice"]);
        let bob = UserId::new("bob".to_string()).unwrap();

        // when (操作):
        room.add_participant(bob.clone());
        room.add_participant(bob.clone());

        // then (期待する結果):
        assert_eq!(room.participants.len(), 2);
        assert!(room.has_participant(&bob));
    }

    #[test]
    fn test_remove_participant_reports_membership() {
        // テスト項目: 参加者の削除が成否を返す
        // given (前提条件):
        let mut room = test_room(RoomKind::Group, &["alice", "bob"]);
        let alice = UserId::new("alice".to_string()).unwrap();
        let charlie = UserId::new("charlie".to_string()).unwrap();

        // when (操作):
        let removed = room.remove_participant(&alice);
        let missing = room.remove_participant(&charlie);

        // then (期待する結果):
        assert!(removed);
        assert!(!missing);
        assert_eq!(room.participants.len(), 1);
    }

    #[test]
    fn test_empty_room_is_detected() {
        // テスト項目: 参加者が空になったルームを検出できる
        // given (前提条件):
        let mut room = test_room(RoomKind::Group, &["alice"]);
        let alice = UserId::new("alice".to_string()).unwrap();

        // when (操作):
        room.remove_participant(&alice);

        // then (期待する結果):
        assert!(room.is_empty());
    }

    #[test]
    fn test_sorted_participants_is_deterministic() {
        // テスト項目: 参加者リストが名前順で返される
        // given (前提条件):
        let room = test_room(RoomKind::Group, &["charlie", "alice", "bob"]);

        // when (操作):
        let sorted = room.sorted_participants();

        // then (期待する結果):
        let names: Vec<&str> = sorted.iter().map(|id| id.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "charlie"]);
    }

    #[test]
    fn test_mark_as_read_sets_state_once() {
        // テスト項目: 既読化が一度だけ状態を変え、二度目は no-op になる（冪等性）
        // given (前提条件):
        let mut message = test_message("alice");

        // when (操作):
        message.mark_as_read(Timestamp::new(2000));
        message.mark_as_read(Timestamp::new(9999));

        // then (期待する結果): read_at は最初の既読時刻のまま
        assert!(message.read);
        assert_eq!(message.read_at, Some(Timestamp::new(2000)));
    }

    #[test]
    fn test_system_message_is_detected() {
        // テスト項目: SYSTEM 送信者のメッセージが判定できる
        // given (前提条件):
        let mut message = test_message("alice");
        message.sender_id = UserId::system();

        // when (操作):
        // then (期待する結果):
        assert!(message.is_system());
    }
}
