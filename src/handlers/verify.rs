use axum::{Json, extract::State};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::{AppError, FieldError};
use crate::models::{AccountStatus, User};
use crate::services::auth::verify_secret;
use crate::services::token::TOKEN_TTL_SECS;
use crate::state::AppState;

use super::is_valid_email;

/// ユーザー不在とコード不一致で同一のメッセージ（列挙攻撃対策）
pub const MSG_INVALID_VERIFICATION: &str = "Invalid email address or verification code.";
const MSG_ALREADY_VERIFIED: &str = "Email address has already been verified.";

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub verification: String,
}

/// メールアドレス認証ハンドラー
///
/// POST /api/users/verify
///
/// 成功時に unverified → active へ遷移し、初回のトークンを発行する。
pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<String>, AppError> {
    validate_verify_request(&request)?;

    let Some(mut user) = state.user_repo.find_by_email(&request.email).await? else {
        return Err(AppError::Unauthorized(MSG_INVALID_VERIFICATION));
    };

    apply_email_verification(&mut user, &request.verification)?;
    let user = state.user_repo.save(&user).await?;

    let token = state.token_service.issue(&user, TOKEN_TTL_SECS)?;

    tracing::info!(email = %user.email, "メール認証成功");

    Ok(Json(token))
}

/// 認証コードを照合し、unverified → active への遷移を適用する
///
/// 遷移は一度きり。認証済み・停止中のアカウントには InvalidState を返す。
fn apply_email_verification(user: &mut User, code: &str) -> Result<(), AppError> {
    if user.status != AccountStatus::Unverified {
        return Err(AppError::InvalidState(MSG_ALREADY_VERIFIED));
    }

    // 未認証なのにハッシュが無いレコードはコード不一致と同じ扱い
    let matched = match &user.verification_hash {
        Some(hash) => verify_secret(code, hash)?,
        None => false,
    };
    if !matched {
        tracing::warn!(email = %user.email, "メール認証失敗: コード不一致");
        return Err(AppError::Unauthorized(MSG_INVALID_VERIFICATION));
    }

    user.verification_hash = None;
    user.status = AccountStatus::Active;
    user.last_login = Some(OffsetDateTime::now_utc());
    Ok(())
}

/// 認証リクエストのバリデーション
fn validate_verify_request(request: &VerifyRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if !is_valid_email(&request.email) {
        errors.push(FieldError::body(
            "email",
            "Please provide a valid email address.",
        ));
    }
    if request.verification.is_empty() {
        errors.push(FieldError::body(
            "verification",
            "Please provide a valid verification code.",
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
    use crate::services::auth::hash_secret;

    fn unverified_user(code: &str) -> User {
        User::new(
            "Jane Doe",
            "jane@x.com",
            hash_secret("secret12").unwrap(),
            hash_secret(code).unwrap(),
        )
    }

    #[test]
    fn test_verification_activates_account_once() {
        let mut user = unverified_user("ABCDEFG2");

        assert!(apply_email_verification(&mut user, "ABCDEFG2").is_ok());
        assert_eq!(user.status, AccountStatus::Active);
        assert!(user.verification_hash.is_none());
        assert!(user.last_login.is_some());

        // 認証済みアカウントへの再認証は状態エラー
        match apply_email_verification(&mut user, "ABCDEFG2") {
            Err(AppError::InvalidState(msg)) => assert_eq!(msg, MSG_ALREADY_VERIFIED),
            other => panic!("expected invalid state error, got {other:?}"),
        }
    }

    #[test]
    fn test_verification_rejects_wrong_code() {
        let mut user = unverified_user("ABCDEFG2");

        match apply_email_verification(&mut user, "WRONGCOD") {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, MSG_INVALID_VERIFICATION),
            other => panic!("expected unauthorized error, got {other:?}"),
        }
        assert_eq!(user.status, AccountStatus::Unverified);
        assert!(user.verification_hash.is_some());
    }

    #[test]
    fn test_verification_rejects_missing_hash() {
        let mut user = unverified_user("ABCDEFG2");
        user.verification_hash = None;

        match apply_email_verification(&mut user, "ABCDEFG2") {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, MSG_INVALID_VERIFICATION),
            other => panic!("expected unauthorized error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_valid_request() {
        let request = VerifyRequest {
            email: "jane@x.com".to_string(),
            verification: "ABCDEFG2".to_string(),
        };
        assert!(validate_verify_request(&request).is_ok());
    }

    #[test]
    fn test_validate_invalid_email() {
        let request = VerifyRequest {
            email: "invalid-email".to_string(),
            verification: "ABCDEFG2".to_string(),
        };
        assert!(validate_verify_request(&request).is_err());
    }

    #[test]
    fn test_validate_empty_code() {
        let request = VerifyRequest {
            email: "jane@x.com".to_string(),
            verification: String::new(),
        };
        assert!(validate_verify_request(&request).is_err());
    }
}
