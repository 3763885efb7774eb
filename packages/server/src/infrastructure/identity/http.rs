//! HTTP ベースの IdentityResolver 実装
//!
//! ユーザーサービスの REST API（`GET /api/users/{user_id}`）に
//! 問い合わせて表示名を解決します。失敗はエラーとして返し、
//! プレースホルダへの劣化は呼び出し側（`display_name_or_fallback`）が
//! 行います。

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{IdentityError, IdentityResolver, UserId};

/// ユーザーサービスの応答のうち、このエンジンが使う部分
#[derive(Debug, Deserialize)]
struct UserResponse {
    username: Option<String>,
}

/// HTTP ベースの IdentityResolver 実装
pub struct HttpIdentityResolver {
    base_url: String,
    client: reqwest::Client,
}

impl HttpIdentityResolver {
    /// 新しい HttpIdentityResolver を作成
    ///
    /// # Arguments
    ///
    /// * `base_url` - ユーザーサービスのベース URL（例: `http://localhost:8081`）
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve_display_name(&self, user_id: &UserId) -> Result<String, IdentityError> {
        let url = format!("{}/api/users/{}", self.base_url, user_id.as_str());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IdentityError::ResolveFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::UnknownUser(user_id.as_str().to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|e| IdentityError::ResolveFailed(e.to_string()))?;

        let body: UserResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::ResolveFailed(e.to_string()))?;

        body.username
            .ok_or_else(|| IdentityError::UnknownUser(user_id.as_str().to_string()))
    }
}
