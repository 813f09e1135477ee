use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// 新規アカウントに付与されるロール
pub const DEFAULT_ROLE: &str = "member";

/// アカウントの状態。TEXT カラムとして保存される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Unverified,
    Active,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown account status: {0}")]
pub struct UnknownStatus(String);

impl TryFrom<String> for AccountStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "unverified" => Ok(Self::Unverified),
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// 永続化されるアカウントレコード
///
/// # Security
/// このままクライアントへ返さないこと。読み出しは必ず `profile()` を通す。
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub role: String,
    #[sqlx(try_from = "String")]
    pub status: AccountStatus,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// 未認証の間だけ存在する認証コードのハッシュ
    pub verification_hash: Option<String>,
    /// 回復フローが開いている間だけ存在する回復コードのハッシュ
    pub recovery_hash: Option<String>,
    /// true の間は現パスワード確認なしの変更が許可される（回復直後のみ）
    pub reset_flag: bool,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// 未認証状態の新規アカウントを作成
    pub fn new(name: &str, email: &str, password_hash: String, verification_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: DEFAULT_ROLE.to_string(),
            status: AccountStatus::Unverified,
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            verification_hash: Some(verification_hash),
            recovery_hash: None,
            reset_flag: false,
            last_login: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// シークレット項目を取り除いたクライアント向けビュー
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            role: self.role.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            last_login: self.last_login,
            created: self.created_at,
        }
    }
}

/// クライアントへ返すアカウント情報。
/// password_hash / verification_hash / recovery_hash / reset_flag / status は含めない。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub role: String,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}
