use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// メールアドレスでアカウントを検索
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, role, status, name, email, password_hash,
                   verification_hash, recovery_hash, reset_flag, last_login, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// アカウントIDでアカウントを検索
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, role, status, name, email, password_hash,
                   verification_hash, recovery_hash, reset_flag, last_login, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// アカウントを upsert する（id 基準）。新規なら INSERT、既存なら全項目を更新。
    ///
    /// # Errors
    /// - UNIQUE制約違反時: `sqlx::Error::Database` (constraint = "users_email_key")
    ///   呼び出し側で `AppError::Conflict` に変換すること
    ///
    /// # Note
    /// password_hash / verification_hash / recovery_hash はログに出力しないこと
    pub async fn save(&self, user: &User) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, role, status, name, email, password_hash,
                               verification_hash, recovery_hash, reset_flag, last_login, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                role = EXCLUDED.role,
                status = EXCLUDED.status,
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                verification_hash = EXCLUDED.verification_hash,
                recovery_hash = EXCLUDED.recovery_hash,
                reset_flag = EXCLUDED.reset_flag,
                last_login = EXCLUDED.last_login
            RETURNING id, role, status, name, email, password_hash,
                      verification_hash, recovery_hash, reset_flag, last_login, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.role)
        .bind(user.status.as_str())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.verification_hash)
        .bind(&user.recovery_hash)
        .bind(user.reset_flag)
        .bind(user.last_login)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
    }
}
