//! IdentityResolver trait 定義
//!
//! ユーザー ID から表示名を引くための読み取り専用インターフェース。
//! ユーザープロフィールは外部サービスの管轄であり、このエンジンは
//! 応答の装飾にだけ表示名を使います。解決の失敗は呼び出し元の操作を
//! 失敗させず、プレースホルダ名に劣化します。

use async_trait::async_trait;

use super::{error::IdentityError, value_object::UserId};

/// 表示名が解決できないときのプレースホルダ
pub const FALLBACK_DISPLAY_NAME: &str = "Unknown User";

/// SYSTEM 送信者の表示名（リゾルバには問い合わせない）
pub const SYSTEM_DISPLAY_NAME: &str = "System";

/// IdentityResolver trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// ユーザー ID から表示名を解決する
    async fn resolve_display_name(&self, user_id: &UserId) -> Result<String, IdentityError>;
}

/// 表示名を解決し、失敗時はプレースホルダに劣化させる
pub async fn display_name_or_fallback(resolver: &dyn IdentityResolver, user_id: &UserId) -> String {
    if user_id.is_system() {
        return SYSTEM_DISPLAY_NAME.to_string();
    }
    match resolver.resolve_display_name(user_id).await {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!(
                "Failed to resolve display name for '{}': {}",
                user_id.as_str(),
                e
            );
            FALLBACK_DISPLAY_NAME.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_display_name_resolves_via_resolver() {
        // テスト項目: リゾルバが成功した場合はその表示名が返される
        // given (前提条件):
        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_resolve_display_name()
            .returning(|_| Ok("Alice".to_string()));
        let alice = UserId::new("alice".to_string()).unwrap();

        // when (操作):
        let name = display_name_or_fallback(&resolver, &alice).await;

        // then (期待する結果):
        assert_eq!(name, "Alice");
    }

    #[tokio::test]
    async fn test_display_name_degrades_to_placeholder() {
        // テスト項目: リゾルバ失敗時にプレースホルダ名へ劣化する
        // given (前提条件):
        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_resolve_display_name()
            .returning(|id| Err(IdentityError::UnknownUser(id.as_str().to_string())));
        let alice = UserId::new("alice".to_string()).unwrap();

        // when (操作):
        let name = display_name_or_fallback(&resolver, &alice).await;

        // then (期待する結果):
        assert_eq!(name, FALLBACK_DISPLAY_NAME);
    }

    #[tokio::test]
    async fn test_system_sender_skips_resolver() {
        // テスト項目: SYSTEM 送信者はリゾルバに問い合わせず固定名になる
        // given (前提条件): resolve が呼ばれたら panic するモック
        let mut resolver = MockIdentityResolver::new();
        resolver.expect_resolve_display_name().never();

        // when (操作):
        let name = display_name_or_fallback(&resolver, &UserId::system()).await;

        // then (期待する結果):
        assert_eq!(name, SYSTEM_DISPLAY_NAME);
    }
}
