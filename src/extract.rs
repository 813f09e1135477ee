use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::token::TokenUser;
use crate::state::AppState;

/// 認証トークンを運ぶリクエストヘッダー
pub const AUTH_HEADER: &str = "x-auth-token";

/// `x-auth-token` ヘッダーを検証して取り出した認証済みアカウント
///
/// ヘッダー欠落と検証失敗で別のエラーボディを返す（旧ミドルウェア互換）。
#[derive(Debug, Clone)]
pub struct AuthUser(pub TokenUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(AUTH_HEADER) else {
            return Err(AppError::MissingToken);
        };
        // ヘッダーは存在するが文字列として読めない場合は無効トークン扱い
        let token = value.to_str().map_err(|_| AppError::InvalidToken)?;

        let claims = state.token_service.verify(token)?;
        Ok(AuthUser(claims.user))
    }
}
