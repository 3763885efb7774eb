//! MessagePusher trait 定義
//!
//! ライブ配信の送信経路を抽象化します。トランスポート層が接続ごとの
//! 送信チャンネルを登録し、Broadcaster がそのチャンネルへイベントを
//! 流します。具体的な実装は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::PushError, value_object::ConnectionId};

/// 接続 1 本へメッセージを送るためのチャンネル
///
/// unbounded チャンネルなので送信はブロックしない。受信側が落ちて
/// いれば send が失敗するだけで、送信経路には影響しない。
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// MessagePusher trait
///
/// 接続レジストリと送信処理のインターフェース。配信はベストエフォート
/// であり、個々の接続への送信失敗が呼び出し元の操作を失敗させることは
/// ありません。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録する
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続を登録解除する
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 特定の接続にメッセージを送る
    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), PushError>;

    /// 複数の接続にメッセージをブロードキャストする
    ///
    /// 一部の接続への送信失敗は許容され、ログに記録して破棄されます。
    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str);
}
