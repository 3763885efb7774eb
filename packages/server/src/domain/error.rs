//! エラー型定義
//!
//! チャットエンジンが呼び出し元に返すエラー（`ChatError`）と、
//! 各インターフェース実装が返す内部エラーを定義します。
//! ストア層のエラーは UseCase 層で `ChatError` に変換されます。

use thiserror::Error;

use super::value_object::RoomId;

/// チャットエンジンの操作が返すエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    /// ルームまたはメッセージが存在しない
    #[error("not found: {0}")]
    NotFound(String),

    /// 送信者がルームの参加者ではない
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 引数が不正（本文超過、空 ID、参加していないユーザーの削除など）
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// ルームの状態制約に違反（DIRECT ルームの人数超過など）
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// 同時作成の競合（内部で 1 回再読込リトライした後に残る場合のみ）
    #[error("conflict: {0}")]
    Conflict(String),
}

/// ストア実装が返すエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("chat room not found with id: {0}")]
    RoomNotFound(String),

    #[error("message not found with id: {0}")]
    MessageNotFound(String),

    /// 同一ペアの DIRECT ルームが既に存在する（一意性制約）
    #[error("direct room already exists: {existing:?}")]
    DuplicateDirectRoom { existing: RoomId },
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RoomNotFound(id) => {
                ChatError::NotFound(format!("chat room not found with id: {}", id))
            }
            StoreError::MessageNotFound(id) => {
                ChatError::NotFound(format!("message not found with id: {}", id))
            }
            StoreError::DuplicateDirectRoom { existing } => ChatError::Conflict(format!(
                "direct room already exists with id: {}",
                existing.as_str()
            )),
        }
    }
}

/// ライブ配信の送信エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PushError {
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// ユーザー名リゾルバのエラー
///
/// このエラーは呼び出し元の操作を失敗させず、プレースホルダ名への
/// フォールバックとして扱われます。
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("user not found: {0}")]
    UnknownUser(String),

    #[error("failed to resolve user: {0}")]
    ResolveFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_maps_to_not_found() {
        // テスト項目: ストアの NotFound 系エラーが ChatError::NotFound に変換される
        // given (前提条件):
        let room_err = StoreError::RoomNotFound("r-1".to_string());
        let msg_err = StoreError::MessageNotFound("m-1".to_string());

        // when (操作):
        let room_chat: ChatError = room_err.into();
        let msg_chat: ChatError = msg_err.into();

        // then (期待する結果):
        assert!(matches!(room_chat, ChatError::NotFound(_)));
        assert!(matches!(msg_chat, ChatError::NotFound(_)));
    }

    #[test]
    fn test_duplicate_direct_room_maps_to_conflict() {
        // テスト項目: DIRECT ルーム重複エラーが ChatError::Conflict に変換される
        // given (前提条件):
        let existing = RoomId::generate();
        let err = StoreError::DuplicateDirectRoom {
            existing: existing.clone(),
        };

        // when (操作):
        let chat_err: ChatError = err.into();

        // then (期待する結果):
        match chat_err {
            ChatError::Conflict(msg) => assert!(msg.contains(existing.as_str())),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }
}
