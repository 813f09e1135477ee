use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{AppError, FieldError};
use crate::models::{AccountStatus, User};
use crate::services::auth::{hash_secret, verify_secret};
use crate::services::otp;
use crate::services::token::TOKEN_TTL_SECS;
use crate::state::AppState;

use super::is_valid_email;

const MSG_RECOVERY_SENT: &str = "An account recovery code has been sent to your email.";
/// ユーザー不在とコード不一致で同一のメッセージ（列挙攻撃対策）
pub const MSG_INVALID_RECOVERY: &str = "Invalid email address or recovery code.";
const MSG_RECOVERY_BAD_STATE: &str =
    "Account is unverified or suspended. Cannot perform account recovery...";

// === 回復コード要求 ===

#[derive(Debug, Deserialize)]
pub struct ForgotRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotResponse {
    pub message: &'static str,
}

/// アカウント回復コード要求ハンドラー
///
/// POST /api/users/forgot
///
/// # Security
/// アカウントの有無に関わらず常に同一のレスポンスを返す（列挙攻撃対策）。
/// 送信はベストエフォート: 失敗してもレスポンスは変えず、
/// 届いていないコードのハッシュは保存しない。
pub async fn request_recovery(
    State(state): State<AppState>,
    Json(request): Json<ForgotRequest>,
) -> Result<Json<ForgotResponse>, AppError> {
    validate_forgot_request(&request)?;

    let Some(mut user) = state.user_repo.find_by_email(&request.email).await? else {
        tracing::info!(email = %request.email, "回復要求: ユーザー不在（汎用レスポンス返却）");
        return Ok(Json(ForgotResponse {
            message: MSG_RECOVERY_SENT,
        }));
    };

    let code = otp::generate_code();

    if let Err(e) = state
        .email_service
        .send(&request.email, "✔ Account Recovery", &code)
        .await
    {
        tracing::warn!(error = ?e, "回復コードの送信に失敗");
        return Ok(Json(ForgotResponse {
            message: MSG_RECOVERY_SENT,
        }));
    }

    user.recovery_hash = Some(hash_secret(&code)?);
    state.user_repo.save(&user).await?;

    tracing::info!(email = %request.email, "回復コード送信完了");

    Ok(Json(ForgotResponse {
        message: MSG_RECOVERY_SENT,
    }))
}

// === 回復完了 ===

#[derive(Debug, Deserialize)]
pub struct RecoveryRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub recovery: String,
}

/// アカウント回復完了ハンドラー
///
/// POST /api/users/recovery
///
/// 成功時は保存済みの回復コードハッシュがそのまま次のパスワードハッシュになる
/// （旧実装の互換挙動）。reset_flag を立てることで次回のパスワード変更は
/// 現パスワード確認なしの強制変更となる。
pub async fn complete_recovery(
    State(state): State<AppState>,
    Json(request): Json<RecoveryRequest>,
) -> Result<Json<String>, AppError> {
    validate_recovery_request(&request)?;

    let Some(mut user) = state.user_repo.find_by_email(&request.email).await? else {
        return Err(AppError::Unauthorized(MSG_INVALID_RECOVERY));
    };

    apply_recovery_completion(&mut user, &request.recovery)?;
    let user = state.user_repo.save(&user).await?;

    let token = state.token_service.issue(&user, TOKEN_TTL_SECS)?;

    tracing::info!(email = %user.email, "アカウント回復成功");

    Ok(Json(token))
}

/// 回復コードを照合し、回復完了の遷移を適用する
///
/// 成功時は保存済みの回復コードハッシュをそのままパスワードハッシュへ昇格し、
/// 回復フローを閉じて reset_flag を立てる。
fn apply_recovery_completion(user: &mut User, code: &str) -> Result<(), AppError> {
    if user.status != AccountStatus::Active {
        return Err(AppError::InvalidState(MSG_RECOVERY_BAD_STATE));
    }

    // 回復フローが開いていなければコード不一致と同じ扱い
    let matched = match &user.recovery_hash {
        Some(hash) => verify_secret(code, hash)?,
        None => false,
    };
    if !matched {
        tracing::warn!(email = %user.email, "回復失敗: コード不一致");
        return Err(AppError::Unauthorized(MSG_INVALID_RECOVERY));
    }

    // 直前の照合で Some を確認済み
    if let Some(recovery_hash) = user.recovery_hash.take() {
        user.password_hash = recovery_hash;
    }
    user.reset_flag = true;
    user.last_login = Some(OffsetDateTime::now_utc());
    Ok(())
}

/// 回復要求リクエストのバリデーション
fn validate_forgot_request(request: &ForgotRequest) -> Result<(), AppError> {
    if !is_valid_email(&request.email) {
        return Err(AppError::Validation(vec![FieldError::body(
            "email",
            "Please provide a valid email address.",
        )]));
    }
    Ok(())
}

/// 回復完了リクエストのバリデーション
fn validate_recovery_request(request: &RecoveryRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if !is_valid_email(&request.email) {
        errors.push(FieldError::body(
            "email",
            "Please provide a valid email address.",
        ));
    }
    if request.recovery.is_empty() {
        errors.push(FieldError::body(
            "recovery",
            "Please provide a valid recovery code.",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recoverable_user(code: &str) -> User {
        let mut user = User::new(
            "Jane Doe",
            "jane@x.com",
            hash_secret("secret12").unwrap(),
            hash_secret("ABCDEFG2").unwrap(),
        );
        user.status = AccountStatus::Active;
        user.verification_hash = None;
        user.recovery_hash = Some(hash_secret(code).unwrap());
        user
    }

    #[test]
    fn test_recovery_promotes_code_hash_to_password() {
        let mut user = recoverable_user("RSTUVWX7");
        let code_hash = user.recovery_hash.clone().unwrap();

        assert!(apply_recovery_completion(&mut user, "RSTUVWX7").is_ok());
        // 保存済みハッシュがそのままパスワードハッシュになる（旧実装の互換挙動）
        assert_eq!(user.password_hash, code_hash);
        assert!(user.recovery_hash.is_none());
        assert!(user.reset_flag);
        assert!(user.last_login.is_some());
    }

    #[test]
    fn test_recovery_rejects_wrong_code() {
        let mut user = recoverable_user("RSTUVWX7");
        let original_hash = user.password_hash.clone();

        match apply_recovery_completion(&mut user, "WRONGCOD") {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, MSG_INVALID_RECOVERY),
            other => panic!("expected unauthorized error, got {other:?}"),
        }
        // 失敗時はパスワードも回復フローも変化しない
        assert_eq!(user.password_hash, original_hash);
        assert!(user.recovery_hash.is_some());
        assert!(!user.reset_flag);
    }

    #[test]
    fn test_recovery_rejects_when_no_flow_open() {
        let mut user = recoverable_user("RSTUVWX7");
        user.recovery_hash = None;

        match apply_recovery_completion(&mut user, "RSTUVWX7") {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, MSG_INVALID_RECOVERY),
            other => panic!("expected unauthorized error, got {other:?}"),
        }
    }

    #[test]
    fn test_recovery_rejects_inactive_account() {
        for status in [AccountStatus::Unverified, AccountStatus::Suspended] {
            let mut user = recoverable_user("RSTUVWX7");
            user.status = status;

            match apply_recovery_completion(&mut user, "RSTUVWX7") {
                Err(AppError::InvalidState(msg)) => assert_eq!(msg, MSG_RECOVERY_BAD_STATE),
                other => panic!("expected invalid state error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_validate_forgot_valid() {
        let request = ForgotRequest {
            email: "jane@x.com".to_string(),
        };
        assert!(validate_forgot_request(&request).is_ok());
    }

    #[test]
    fn test_validate_forgot_invalid_email() {
        let request = ForgotRequest {
            email: "invalid-email".to_string(),
        };
        assert!(validate_forgot_request(&request).is_err());
    }

    #[test]
    fn test_validate_recovery_valid() {
        let request = RecoveryRequest {
            email: "jane@x.com".to_string(),
            recovery: "ABCDEFG2".to_string(),
        };
        assert!(validate_recovery_request(&request).is_ok());
    }

    #[test]
    fn test_validate_recovery_empty_code() {
        let request = RecoveryRequest {
            email: "jane@x.com".to_string(),
            recovery: String::new(),
        };
        assert!(validate_recovery_request(&request).is_err());
    }
}
