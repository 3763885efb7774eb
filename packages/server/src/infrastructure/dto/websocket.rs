//! WebSocket の受信フレーム DTO
//!
//! クライアントからルームのソケットに送られてくるフレームです。
//! 送信者はソケット接続時に認証済みの user_id で確定しているため、
//! フレーム自体はユーザー ID を運びません。
//!
//! 配信側（サーバー → クライアント）のイベントフレームは
//! Broadcaster が所有します。

use serde::Deserialize;

use crate::domain::MessageKind;

/// クライアントからの受信フレーム
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// メッセージ送信
    Send {
        /// 省略時は TEXT
        kind: Option<MessageKind>,
        content: String,
    },
    /// タイピング中通知（永続化されない）
    Typing,
    /// 既読化
    Read { message_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_frame_is_parsed() {
        // テスト項目: send フレームが本文と種別付きでパースされる
        // given (前提条件):
        let json = r#"{"type":"send","kind":"TEXT","content":"hello"}"#;

        // when (操作):
        let frame: ClientFrame = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        match frame {
            ClientFrame::Send { kind, content } => {
                assert_eq!(kind, Some(MessageKind::Text));
                assert_eq!(content, "hello");
            }
            other => panic!("expected Send, got {:?}", other),
        }
    }

    #[test]
    fn test_send_frame_kind_is_optional() {
        // テスト項目: kind を省略した send フレームがパースされる
        // given (前提条件):
        let json = r#"{"type":"send","content":"hello"}"#;

        // when (操作):
        let frame: ClientFrame = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert!(matches!(frame, ClientFrame::Send { kind: None, .. }));
    }

    #[test]
    fn test_typing_and_read_frames_are_parsed() {
        // テスト項目: typing / read フレームがパースされる
        // given (前提条件):
        let typing_json = r#"{"type":"typing"}"#;
        let read_json = r#"{"type":"read","message_id":"m-1"}"#;

        // when (操作):
        let typing: ClientFrame = serde_json::from_str(typing_json).unwrap();
        let read: ClientFrame = serde_json::from_str(read_json).unwrap();

        // then (期待する結果):
        assert!(matches!(typing, ClientFrame::Typing));
        assert!(matches!(read, ClientFrame::Read { message_id } if message_id == "m-1"));
    }

    #[test]
    fn test_unknown_frame_type_is_rejected() {
        // テスト項目: 未知の type がパースエラーになる
        // given (前提条件):
        let json = r#"{"type":"dance"}"#;

        // when (操作):
        let result: Result<ClientFrame, _> = serde_json::from_str(json);

        // then (期待する結果):
        assert!(result.is_err());
    }
}
