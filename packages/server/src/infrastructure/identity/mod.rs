//! ユーザー名リゾルバの実装
//!
//! ## 実装
//!
//! - `http`: ユーザーサービスの REST API に問い合わせる実装
//! - `memory`: 固定マップを引く実装（ユーザーサービス無しでの起動とテスト用）

pub mod http;
pub mod memory;

pub use http::HttpIdentityResolver;
pub use memory::StaticIdentityResolver;
