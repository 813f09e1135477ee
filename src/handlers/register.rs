use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, FieldError};
use crate::models::User;
use crate::services::auth::hash_secret;
use crate::services::otp;
use crate::state::AppState;

use super::is_valid_email;

pub const MSG_EMAIL_IN_USE: &str = "Email address is already in use.";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
}

/// ユーザー登録ハンドラー
///
/// POST /api/users/register
///
/// # Security
/// - パスワード・認証コードはログに出力しない
/// - 認証コードの送信に失敗した場合はアカウントを作成しない
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    validate_register_request(&request)?;

    // 重複チェック
    if state.user_repo.find_by_email(&request.email).await?.is_some() {
        return Err(AppError::Conflict(MSG_EMAIL_IN_USE));
    }

    // 認証コードを生成し、永続化より先に送信する。
    // 送信が失敗したらここで中断し、未送信コード付きのアカウントを残さない。
    let code = otp::generate_code();
    state
        .email_service
        .send(&request.email, "✔ Verify Your Email", &code)
        .await?;

    let password_hash = hash_secret(&request.password)?;
    let verification_hash = hash_secret(&code)?;

    let user = User::new(&request.name, &request.email, password_hash, verification_hash);
    state.user_repo.save(&user).await.map_err(|e| {
        // UNIQUE制約違反（同時登録のレース）も重複として返す
        if let sqlx::Error::Database(db_err) = &e
            && db_err.constraint() == Some("users_email_key")
        {
            return AppError::Conflict(MSG_EMAIL_IN_USE);
        }
        AppError::Database(e)
    })?;

    tracing::info!(email = %request.email, "ユーザー登録成功");

    Ok(Json(RegisterResponse {
        message: "Registration successful. Please check your email...",
    }))
}

/// 登録リクエストのバリデーション（全フィールドのエラーをまとめて返す）
fn validate_register_request(request: &RegisterRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if request.name.trim().is_empty() {
        errors.push(FieldError::body(
            "name",
            "Please provide your first and last name.",
        ));
    }
    if !is_valid_email(&request.email) {
        errors.push(FieldError::body(
            "email",
            "Please provide a valid email address.",
        ));
    }
    // 強制するのは非空のみ。文言の「7文字以上」は旧実装から引き継いだ表示上の規則。
    if request.password.is_empty() {
        errors.push(FieldError::body(
            "password",
            "Please provide a password with at least 7 characters.",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}
