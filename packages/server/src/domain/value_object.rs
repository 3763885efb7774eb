//! 値オブジェクト定義
//!
//! ID・タイムスタンプ・メッセージ本文などの値オブジェクトを定義します。
//! 不正な値はコンストラクタで弾くため、これらの型を受け取る層では
//! バリデーション済みであることが保証されます。

use serde::Serialize;

use super::error::ChatError;

/// メッセージ本文の最大文字数
pub const MAX_CONTENT_CHARS: usize = 1000;

/// ユーザーを識別する ID
///
/// 認証済みの呼び出し元から渡される不透明な ID。`SYSTEM` はシステム
/// メッセージの送信者として予約されています。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserId(String);

impl UserId {
    /// システムメッセージ送信者の予約 ID
    pub const SYSTEM: &'static str = "SYSTEM";

    pub fn new(value: String) -> Result<Self, ChatError> {
        if value.trim().is_empty() {
            return Err(ChatError::InvalidArgument(
                "user id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// システム送信者の UserId を返す
    pub fn system() -> Self {
        Self(Self::SYSTEM.to_string())
    }

    pub fn is_system(&self) -> bool {
        self.0 == Self::SYSTEM
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// チャットルームを識別する ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ChatError> {
        if value.trim().is_empty() {
            return Err(ChatError::InvalidArgument(
                "room id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 新しいルーム ID を採番する（UUID v4）
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// メッセージを識別する ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(value: String) -> Result<Self, ChatError> {
        if value.trim().is_empty() {
            return Err(ChatError::InvalidArgument(
                "message id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 新しいメッセージ ID を採番する（UUID v4）
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// ライブ配信の接続を識別する ID
///
/// トランスポート層の 1 接続に対応します。同一ユーザーが複数接続を
/// 持つことがあるため、UserId とは別の ID 空間です。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ChatError> {
        if value.trim().is_empty() {
            return Err(ChatError::InvalidArgument(
                "connection id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 新しい接続 ID を採番する（UUID v4）
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// メッセージ本文
///
/// 空文字と `MAX_CONTENT_CHARS` 超えはコンストラクタで弾きます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ChatError> {
        if value.is_empty() {
            return Err(ChatError::InvalidArgument(
                "message content must not be empty".to_string(),
            ));
        }
        let chars = value.chars().count();
        if chars > MAX_CONTENT_CHARS {
            return Err(ChatError::InvalidArgument(format!(
                "message content exceeds {} characters (got {})",
                MAX_CONTENT_CHARS, chars
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Unix ミリ秒（UTC）のタイムスタンプ
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// ルーム種別
///
/// DIRECT は常に 2 人のルーム、GROUP は n 人のルーム。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomKind {
    Direct,
    Group,
}

/// メッセージ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Text,
    Image,
    File,
    System,
}
