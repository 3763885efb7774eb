//! メッセージ送信（通知）の実装
//!
//! ## 概要
//!
//! このモジュールは `MessagePusher` trait の具体的な実装を提供します。
//!
//! ## 実装
//!
//! - `channel`: tokio の unbounded チャンネルを使った実装。
//!   WebSocket ハンドラが接続ごとのチャンネルを登録する。

pub mod channel;

pub use channel::ChannelMessagePusher;
