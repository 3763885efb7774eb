//! ドメイン層
//!
//! チャットエンジンのエンティティ・値オブジェクト・エラー型と、
//! ドメイン層が必要とするインターフェース（ストア、プッシャー、
//! ユーザー名リゾルバ）の trait 定義を提供します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

pub mod entity;
pub mod error;
pub mod identity;
pub mod pusher;
pub mod store;
pub mod value_object;

pub use entity::{Message, Room};
pub use error::{ChatError, IdentityError, PushError, StoreError};
pub use identity::{
    FALLBACK_DISPLAY_NAME, IdentityResolver, SYSTEM_DISPLAY_NAME, display_name_or_fallback,
};
pub use pusher::{MessagePusher, PusherChannel};
pub use store::{MessageStore, NewMessage, RoomStore};
pub use value_object::{
    ConnectionId, MessageContent, MessageId, MessageKind, RoomId, RoomKind, Timestamp, UserId,
};
