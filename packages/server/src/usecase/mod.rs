//! UseCase 層
//!
//! チャットエンジンの 3 つのコンポーネントを提供します。
//!
//! - `RoomManager`: ルームのライフサイクルと参加者管理
//! - `MessageService`: メッセージの作成・取得・既読管理・未読集計
//! - `Broadcaster`: 新着メッセージとエフェメラルイベントのライブ配信
//!
//! いずれもドメイン層の trait（ストア、プッシャー、リゾルバ）にのみ
//! 依存し、Infrastructure 層の具体的な実装には依存しません。

pub mod broadcaster;
pub mod message_service;
pub mod room_manager;

pub use broadcaster::Broadcaster;
pub use message_service::MessageService;
pub use room_manager::RoomManager;
