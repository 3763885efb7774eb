//! チャンネルベースの MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - 接続へのメッセージ送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! 接続（WebSocket など）の生成はトランスポート層で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に
//! 使用します。unbounded チャンネルへの送信はブロックしないため、
//! 受信側が遅くても送信経路が止まることはありません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePusher, PushError, PusherChannel};

/// チャンネルベースの MessagePusher 実装
pub struct ChannelMessagePusher {
    /// 登録中の接続の送信チャンネル
    ///
    /// Key: connection_id (String)
    /// Value: PusherChannel
    connections: Mutex<HashMap<String, PusherChannel>>,
}

impl ChannelMessagePusher {
    /// 新しい ChannelMessagePusher を作成
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for ChannelMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePusher for ChannelMessagePusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection_id.as_str().to_string(), sender);
        tracing::debug!(
            "Connection '{}' registered to MessagePusher",
            connection_id.as_str()
        );
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(connection_id.as_str());
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id.as_str()
        );
    }

    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), PushError> {
        let connections = self.connections.lock().await;

        if let Some(sender) = connections.get(connection_id.as_str()) {
            sender
                .send(content.to_string())
                .map_err(|e| PushError::PushFailed(e.to_string()))?;
            Ok(())
        } else {
            Err(PushError::ConnectionNotFound(
                connection_id.as_str().to_string(),
            ))
        }
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str) {
        let connections = self.connections.lock().await;

        for target in targets {
            if let Some(sender) = connections.get(target.as_str()) {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = sender.send(content.to_string()) {
                    tracing::warn!(
                        "Failed to push message to connection '{}': {}",
                        target.as_str(),
                        e
                    );
                }
            } else {
                tracing::warn!(
                    "Connection '{}' not found during broadcast, skipping",
                    target.as_str()
                );
            }
        }
    }
}
