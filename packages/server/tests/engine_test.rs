//! Integration tests for the assembled chat engine.
//!
//! バイナリの main と同じ順序で全コンポーネントを組み立て、
//! ルーム管理・メッセージ配信・既読管理をエンドツーエンドで検証します。

use std::sync::Arc;

use idobata_server::domain::{
    ChatError, ConnectionId, MessageContent, MessageKind, Room, RoomKind, UserId,
};
use idobata_server::infrastructure::{
    identity::StaticIdentityResolver,
    pusher::ChannelMessagePusher,
    store::{InMemoryMessageStore, InMemoryRoomStore},
};
use idobata_server::usecase::{Broadcaster, MessageService, RoomManager};
use idobata_shared::time::SystemClock;
use tokio::sync::mpsc;

struct Engine {
    room_manager: Arc<RoomManager>,
    message_service: Arc<MessageService>,
    broadcaster: Arc<Broadcaster>,
}

/// バイナリと同じ依存関係の組み立て順でエンジンを構築する
fn create_engine() -> Engine {
    let clock = Arc::new(SystemClock);
    let room_store = Arc::new(InMemoryRoomStore::new());
    let message_store = Arc::new(InMemoryMessageStore::new(clock.clone()));
    let identity = Arc::new(StaticIdentityResolver::new([
        ("u1", "User One"),
        ("u2", "User Two"),
        ("u3", "User Three"),
    ]));
    let broadcaster = Arc::new(Broadcaster::new(
        Arc::new(ChannelMessagePusher::new()),
        identity.clone(),
    ));
    let message_service = Arc::new(MessageService::new(
        room_store.clone(),
        message_store,
        broadcaster.clone(),
    ));
    let room_manager = Arc::new(RoomManager::new(
        room_store,
        message_service.clone(),
        identity,
        clock,
    ));
    Engine {
        room_manager,
        message_service,
        broadcaster,
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

fn content(text: &str) -> MessageContent {
    MessageContent::new(text.to_string()).unwrap()
}

#[tokio::test]
async fn test_unread_lifecycle_in_group_room() {
    // テスト項目: グループルームでの未読数のライフサイクル
    // given (前提条件): U1 が U2 と "Team" ルームを作成
    let engine = create_engine();
    let room = engine
        .room_manager
        .create_room(
            "Team".to_string(),
            None,
            RoomKind::Group,
            user("u1"),
            vec![user("u2")],
        )
        .await
        .unwrap();

    // when (操作): U1 が "hello" を送信
    engine
        .message_service
        .send_message(&room.id, user("u1"), MessageKind::Text, content("hello"))
        .await
        .unwrap();

    // then (期待する結果): U2 の未読は 1、U1 の未読は 0
    assert_eq!(
        engine
            .message_service
            .count_unread(&room.id, &user("u2"))
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        engine
            .message_service
            .count_unread(&room.id, &user("u1"))
            .await
            .unwrap(),
        0
    );

    // when (操作): U2 が全既読化
    engine
        .message_service
        .mark_all_read(&room.id, &user("u2"))
        .await
        .unwrap();

    // then (期待する結果): U2 の未読は 0、U1 の未読は変わらず 0
    assert_eq!(
        engine
            .message_service
            .count_unread(&room.id, &user("u2"))
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        engine
            .message_service
            .count_unread(&room.id, &user("u1"))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_message_ordering_across_query_paths() {
    // テスト項目: 連続送信したメッセージが getPage / getSince の両経路で
    //             厳密に増加する順序で、重複も欠落もなく返る
    // given (前提条件):
    let engine = create_engine();
    let room = engine
        .room_manager
        .create_room(
            "Team".to_string(),
            None,
            RoomKind::Group,
            user("u1"),
            vec![user("u2")],
        )
        .await
        .unwrap();

    // when (操作): 10 件送信
    for i in 0..10 {
        engine
            .message_service
            .send_message(
                &room.id,
                user("u1"),
                MessageKind::Text,
                content(&format!("message {}", i)),
            )
            .await
            .unwrap();
    }

    // then (期待する結果): ページングを全部つなぐと新しい順で 10 件
    let mut collected = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let (page, next) = engine
            .message_service
            .get_page(&room.id, 3, token.as_deref())
            .await
            .unwrap();
        collected.extend(page);
        match next {
            Some(next_token) => token = Some(next_token),
            None => break,
        }
    }
    assert_eq!(collected.len(), 10);
    for pair in collected.windows(2) {
        assert!(pair[0].sent_at > pair[1].sent_at);
    }

    // then (期待する結果): getSince(0) は同じ 10 件を古い順で返す
    let since = engine
        .message_service
        .get_since(&room.id, idobata_server::domain::Timestamp::new(0))
        .await
        .unwrap();
    assert_eq!(since.len(), 10);
    for pair in since.windows(2) {
        assert!(pair[0].sent_at < pair[1].sent_at);
    }
    let newest_first: Vec<_> = since.iter().rev().collect();
    for (a, b) in newest_first.iter().zip(collected.iter()) {
        assert_eq!(a.id, b.id);
    }
}

#[tokio::test]
async fn test_concurrent_direct_room_requests_converge() {
    // テスト項目: 同じペアへの並行 getOrCreateDirectRoom が全て同じ
    //             ルーム ID を返し、DIRECT ルームが 1 つだけ残る
    // given (前提条件):
    let engine = create_engine();
    let manager = engine.room_manager.clone();

    // when (操作): 16 タスクが引数の順序を混ぜて同時に要求
    let mut handles = Vec::new();
    for i in 0..16 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let (a, b) = if i % 2 == 0 { ("u1", "u2") } else { ("u2", "u1") };
            manager
                .get_or_create_direct_room(&user(a), &user(b))
                .await
                .unwrap()
                .id
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    // then (期待する結果): 全結果が同一で、u1 のルーム一覧にも 1 件だけ
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let direct_rooms: Vec<Room> = engine
        .room_manager
        .list_rooms_for_user(&user("u1"))
        .await
        .into_iter()
        .filter(Room::is_direct)
        .collect();
    assert_eq!(direct_rooms.len(), 1);
    assert_eq!(direct_rooms[0].id, ids[0]);
}

#[tokio::test]
async fn test_live_fanout_and_catch_up_equivalence() {
    // テスト項目: ライブ配信を受けた購読者と、切断後に getSince で
    //             追いついたクライアントが同じメッセージ集合を見る
    // given (前提条件): ルームに接続済みの購読者が 1 人
    let engine = create_engine();
    let room = engine
        .room_manager
        .create_room(
            "Team".to_string(),
            None,
            RoomKind::Group,
            user("u1"),
            vec![user("u2")],
        )
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let connection_id = ConnectionId::generate();
    engine
        .broadcaster
        .subscribe(room.id.clone(), connection_id.clone(), tx)
        .await;

    // when (操作): 接続中に 1 件、切断後に 2 件送信
    let live = engine
        .message_service
        .send_message(&room.id, user("u1"), MessageKind::Text, content("live"))
        .await
        .unwrap();

    let frame = rx.recv().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(parsed["type"], "message");
    assert_eq!(parsed["id"], live.id.as_str());
    assert_eq!(parsed["sender_name"], "User One");

    engine.broadcaster.unsubscribe(&room.id, &connection_id).await;
    let missed1 = engine
        .message_service
        .send_message(&room.id, user("u1"), MessageKind::Text, content("missed 1"))
        .await
        .unwrap();
    let missed2 = engine
        .message_service
        .send_message(&room.id, user("u2"), MessageKind::Text, content("missed 2"))
        .await
        .unwrap();

    // then (期待する結果): 最後に受信したメッセージ以降を getSince で
    // 取りこぼし無く回収できる
    let caught_up = engine
        .message_service
        .get_since(&room.id, live.sent_at)
        .await
        .unwrap();
    assert_eq!(caught_up, vec![missed1, missed2]);
}

#[tokio::test]
async fn test_membership_changes_fan_out_system_messages() {
    // テスト項目: 参加・退出の SYSTEM メッセージが購読者にライブ配信される
    // given (前提条件): U1 のルームを購読中
    let engine = create_engine();
    let room = engine
        .room_manager
        .create_room(
            "Team".to_string(),
            None,
            RoomKind::Group,
            user("u1"),
            vec![],
        )
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    engine
        .broadcaster
        .subscribe(room.id.clone(), ConnectionId::generate(), tx)
        .await;

    // when (操作): U2 が参加
    engine
        .room_manager
        .add_participants(&room.id, vec![user("u2")])
        .await
        .unwrap();

    // then (期待する結果): SYSTEM メッセージのフレームが届く
    let frame = rx.recv().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(parsed["type"], "message");
    assert_eq!(parsed["kind"], "SYSTEM");
    assert_eq!(parsed["sender_id"], "SYSTEM");
    assert_eq!(parsed["sender_name"], "System");
    assert_eq!(parsed["content"], "User Two joined the room");
}

#[tokio::test]
async fn test_direct_room_cardinality_is_enforced() {
    // テスト項目: DIRECT ルームへの 3 人目追加が拒否され、ルームが
    //             変更されないまま残る
    // given (前提条件):
    let engine = create_engine();
    let room = engine
        .room_manager
        .get_or_create_direct_room(&user("u1"), &user("u2"))
        .await
        .unwrap();

    // when (操作):
    let result = engine
        .room_manager
        .add_participants(&room.id, vec![user("u3")])
        .await;

    // then (期待する結果):
    assert!(matches!(result, Err(ChatError::InvalidState(_))));
    let reloaded = engine.room_manager.get_room(&room.id).await.unwrap();
    assert_eq!(reloaded.participants.len(), 2);
}

#[tokio::test]
async fn test_last_participant_leaving_destroys_room() {
    // テスト項目: 最後の参加者の退出でルームが消え、getRoom が NotFound、
    //             メッセージも残らない
    // given (前提条件): U1, U2 のルームにメッセージ 1 件
    let engine = create_engine();
    let room = engine
        .room_manager
        .create_room(
            "Team".to_string(),
            None,
            RoomKind::Group,
            user("u1"),
            vec![user("u2")],
        )
        .await
        .unwrap();
    let message = engine
        .message_service
        .send_message(&room.id, user("u1"), MessageKind::Text, content("hello"))
        .await
        .unwrap();

    // when (操作): 全員が退出
    engine
        .room_manager
        .remove_participant(&room.id, &user("u2"))
        .await
        .unwrap();
    let last = engine
        .room_manager
        .remove_participant(&room.id, &user("u1"))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(last, None);
    assert!(matches!(
        engine.room_manager.get_room(&room.id).await,
        Err(ChatError::NotFound(_))
    ));
    assert!(matches!(
        engine.message_service.get_by_id(&message.id).await,
        Err(ChatError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_content_search_matches_substring_only() {
    // テスト項目: 本文検索が該当メッセージだけを返す
    // given (前提条件):
    let engine = create_engine();
    let room = engine
        .room_manager
        .create_room(
            "Team".to_string(),
            None,
            RoomKind::Group,
            user("u1"),
            vec![user("u2")],
        )
        .await
        .unwrap();
    engine
        .message_service
        .send_message(
            &room.id,
            user("u1"),
            MessageKind::Text,
            content("hello there"),
        )
        .await
        .unwrap();
    engine
        .message_service
        .send_message(&room.id, user("u2"), MessageKind::Text, content("goodbye"))
        .await
        .unwrap();

    // when (操作):
    let hits = engine
        .message_service
        .search_by_content(&room.id, "hello")
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content.as_str(), "hello there");
}

#[tokio::test]
async fn test_sender_cannot_read_own_message_into_unread() {
    // テスト項目: 自分のメッセージは自分の未読に一度も数えられず、
    //             markRead しても状態が変わらない
    // given (前提条件):
    let engine = create_engine();
    let room = engine
        .room_manager
        .get_or_create_direct_room(&user("u1"), &user("u2"))
        .await
        .unwrap();
    let message = engine
        .message_service
        .send_message(&room.id, user("u1"), MessageKind::Text, content("hi"))
        .await
        .unwrap();

    // when (操作): 送信者自身が既読化を試みる
    engine
        .message_service
        .mark_read(&message.id, &user("u1"))
        .await
        .unwrap();

    // then (期待する結果): メッセージは未読のまま、u1 の未読数は 0
    let reloaded = engine
        .message_service
        .get_by_id(&message.id)
        .await
        .unwrap();
    assert!(!reloaded.read);
    assert_eq!(
        engine
            .message_service
            .count_unread(&room.id, &user("u1"))
            .await
            .unwrap(),
        0
    );
}
