use axum::{Json, extract::State};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::{AppError, FieldError};
use crate::services::AuthService;
use crate::services::token::TOKEN_TTL_SECS;
use crate::state::AppState;

use super::is_valid_email;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// ログインハンドラー
///
/// POST /api/users
///
/// 成功時は JSON 文字列としてトークンのみを返す（旧クライアント互換）。
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<String>, AppError> {
    validate_login_request(&request)?;

    let auth_service = AuthService::new(state.user_repo.clone());
    let mut user = auth_service
        .authenticate(&request.email, &request.password)
        .await?;

    user.last_login = Some(OffsetDateTime::now_utc());
    let user = state.user_repo.save(&user).await?;

    let token = state.token_service.issue(&user, TOKEN_TTL_SECS)?;

    tracing::info!(email = %user.email, "ログイン成功");

    Ok(Json(token))
}

/// ログインリクエストのバリデーション
fn validate_login_request(request: &LoginRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if !is_valid_email(&request.email) {
        errors.push(FieldError::body(
            "email",
            "Please provide a valid email address.",
        ));
    }
    if request.password.is_empty() {
        errors.push(FieldError::body(
            "password",
            "Please provide a valid password.",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}
