//! 固定マップを引く IdentityResolver 実装
//!
//! ユーザーサービス無しでサーバーを起動する場合とテストで使います。

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{IdentityError, IdentityResolver, UserId};

/// 固定マップを引く IdentityResolver 実装
pub struct StaticIdentityResolver {
    names: HashMap<String, String>,
}

impl StaticIdentityResolver {
    /// 表示名マップから作成する
    pub fn new<K, V>(names: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// 空のマップで作成する（全ユーザーがプレースホルダ名に劣化する）
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
        }
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve_display_name(&self, user_id: &UserId) -> Result<String, IdentityError> {
        self.names
            .get(user_id.as_str())
            .cloned()
            .ok_or_else(|| IdentityError::UnknownUser(user_id.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_known_user() {
        // テスト項目: 登録済みユーザーの表示名が引ける
        // given (前提条件):
        let resolver = StaticIdentityResolver::new([("alice", "Alice")]);
        let alice = UserId::new("alice".to_string()).unwrap();

        // when (操作):
        let name = resolver.resolve_display_name(&alice).await;

        // then (期待する結果):
        assert_eq!(name.unwrap(), "Alice");
    }

    #[tokio::test]
    async fn test_unknown_user_is_an_error() {
        // テスト項目: 未登録ユーザーが UnknownUser エラーになる
        // given (前提条件):
        let resolver = StaticIdentityResolver::empty();
        let bob = UserId::new("bob".to_string()).unwrap();

        // when (操作):
        let result = resolver.resolve_display_name(&bob).await;

        // then (期待する結果):
        assert!(matches!(result, Err(IdentityError::UnknownUser(_))));
    }
}
