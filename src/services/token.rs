use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;

/// 全フロー共通のトークン有効期間（秒）
pub const TOKEN_TTL_SECS: i64 = 3600;

/// トークンに載せるアカウント情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUser {
    pub id: Uuid,
    pub role: String,
    pub reset: bool,
}

/// JWT クレーム。`user` のネスト構造は旧クライアントとの互換契約。
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user: TokenUser,
    pub iat: i64,
    pub exp: i64,
}

/// 署名付きトークンの発行と検証（HS256）
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// アカウントに対して署名付きトークンを発行
    pub fn issue(&self, user: &User, ttl_secs: i64) -> Result<String, AppError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            user: TokenUser {
                id: user.id,
                role: user.role.clone(),
                reset: user.reset_flag,
            },
            iat: now,
            exp: now + ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = ?e, "トークン署名エラー");
            AppError::Internal(anyhow::anyhow!("token signing error"))
        })
    }

    /// トークンを検証してクレームを取り出す。
    /// 失敗理由（改ざん・形式不正・期限切れ）は区別せず 401 に落とす。
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = ?e, "トークン検証失敗");
                AppError::InvalidToken
            })
    }
}
