use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// バリデーションで弾かれたフィールドの詳細。
/// `{ errors: [{ msg, param, location }] }` の形で返す（旧クライアント互換）。
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub msg: &'static str,
    pub param: &'static str,
    pub location: &'static str,
}

impl FieldError {
    /// リクエストボディ由来のフィールドエラー
    pub fn body(param: &'static str, msg: &'static str) -> Self {
        Self {
            msg,
            param,
            location: "body",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("バリデーションエラー")]
    Validation(Vec<FieldError>),

    #[error("重複エラー: {0}")]
    Conflict(&'static str),

    #[error("認証エラー: {0}")]
    Unauthorized(&'static str),

    #[error("アカウント状態エラー: {0}")]
    InvalidState(&'static str),

    #[error("トークン未提示")]
    MissingToken,

    #[error("無効または期限切れのトークン")]
    InvalidToken,

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("メール送信エラー")]
    Email(#[from] lettre::transport::smtp::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),
}

const MSG_INTERNAL: &str = "An unexpected error occurred. Please try your request again later...";
const MSG_NO_TOKEN: &str = "No Token Found... Authentication Failed";
const MSG_BAD_TOKEN: &str = "Invalid Token... Authentication Failed.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            Self::Conflict(message) | Self::InvalidState(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            Self::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
            }
            // ヘッダー欠落のみ `msg` キー（旧ミドルウェアの非対称をそのまま維持）
            Self::MissingToken => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "msg": MSG_NO_TOKEN }))).into_response()
            }
            Self::InvalidToken => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "message": MSG_BAD_TOKEN })))
                    .into_response()
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                internal_error()
            }
            Self::Email(e) => {
                tracing::error!(error = ?e, "メール送信エラー");
                internal_error()
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                internal_error()
            }
        }
    }
}

/// 詳細はサーバーログのみに残し、クライアントには汎用メッセージを返す
fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": MSG_INTERNAL })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_shape() {
        let error = FieldError::body("email", "Please provide a valid email address.");
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["msg"], "Please provide a valid email address.");
        assert_eq!(value["param"], "email");
        assert_eq!(value["location"], "body");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Validation(vec![]), StatusCode::BAD_REQUEST),
            (AppError::Conflict("dup"), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("nope"), StatusCode::UNAUTHORIZED),
            (AppError::InvalidState("bad"), StatusCode::BAD_REQUEST),
            (AppError::MissingToken, StatusCode::UNAUTHORIZED),
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
            (
                AppError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
