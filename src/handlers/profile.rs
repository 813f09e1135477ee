use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, FieldError};
use crate::extract::AuthUser;
use crate::models::{User, UserProfile};
use crate::services::auth::{hash_secret, verify_secret};
use crate::state::AppState;

pub const MSG_NO_USERS: &str = "No Users Found...";
const MSG_INVALID_PASSWORD: &str = "Invalid password was provided.";
const MSG_PASSWORD_UPDATED: &str = "Password Updated Successfully.";

/// ログイン中アカウントの取得ハンドラー
///
/// GET /api/users
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let Some(user) = state.user_repo.find_by_id(auth.id).await? else {
        return Err(AppError::Unauthorized(MSG_NO_USERS));
    };

    Ok(Json(user.profile()))
}

// === 表示名更新 ===

#[derive(Debug, Deserialize)]
pub struct UpdateNameRequest {
    #[serde(default)]
    pub name: String,
}

/// 表示名更新ハンドラー
///
/// PUT /api/users
pub async fn update_name(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<UpdateNameRequest>,
) -> Result<Json<UserProfile>, AppError> {
    validate_update_name_request(&request)?;

    let Some(mut user) = state.user_repo.find_by_id(auth.id).await? else {
        return Err(AppError::Unauthorized(MSG_NO_USERS));
    };

    user.name = request.name;
    let user = state.user_repo.save(&user).await?;

    tracing::info!(email = %user.email, "表示名更新成功");

    Ok(Json(user.profile()))
}

// === パスワード変更 ===

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub newpassword: String,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse {
    pub message: &'static str,
}

/// パスワード変更ハンドラー
///
/// PUT /api/users/secure
///
/// reset_flag が立っている場合（回復フロー直後）は現パスワードの確認を
/// 省略し、変更と同時にフラグを下ろす。
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, AppError> {
    validate_change_password_request(&request)?;

    let Some(mut user) = state.user_repo.find_by_id(auth.id).await? else {
        return Err(AppError::Unauthorized(MSG_NO_USERS));
    };

    apply_password_change(&mut user, &request.password, &request.newpassword)?;
    state.user_repo.save(&user).await?;

    tracing::info!(email = %user.email, "パスワード更新成功");

    Ok(Json(ChangePasswordResponse {
        message: MSG_PASSWORD_UPDATED,
    }))
}

/// パスワード変更の分岐を適用する
///
/// reset_flag が立っている場合（回復フロー直後）は現パスワードの照合を省略して
/// フラグを下ろす。それ以外は現パスワードの一致が必須。
fn apply_password_change(
    user: &mut User,
    current: &str,
    new_password: &str,
) -> Result<(), AppError> {
    if user.reset_flag {
        user.reset_flag = false;
    } else if !verify_secret(current, &user.password_hash)? {
        tracing::warn!(email = %user.email, "パスワード変更失敗: 現パスワード不一致");
        return Err(AppError::Unauthorized(MSG_INVALID_PASSWORD));
    }

    user.password_hash = hash_secret(new_password)?;
    Ok(())
}

/// 表示名更新リクエストのバリデーション
fn validate_update_name_request(request: &UpdateNameRequest) -> Result<(), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation(vec![FieldError::body(
            "name",
            "Please provide your first and last name.",
        )]));
    }
    Ok(())
}

/// パスワード変更リクエストのバリデーション
fn validate_change_password_request(request: &ChangePasswordRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if request.password.is_empty() {
        errors.push(FieldError::body(
            "password",
            "Please provide your current password.",
        ));
    }
    // 強制するのは非空のみ。文言の「7文字以上」は旧実装から引き継いだ表示上の規則。
    if request.newpassword.is_empty() {
        errors.push(FieldError::body(
            "newpassword",
            "Please create a new password with at least 7 characters.",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}
