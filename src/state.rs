use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::UserRepository;
use crate::services::{EmailService, TokenService};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL コネクションプール
    pub db_pool: PgPool,
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// アカウントリポジトリ
    pub user_repo: UserRepository,
    /// メールサービス
    pub email_service: EmailService,
    /// トークンサービス
    pub token_service: TokenService,
}

impl AppState {
    /// 新しい AppState を作成
    pub fn new(db_pool: PgPool, config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let user_repo = UserRepository::new(db_pool.clone());
        let email_service = EmailService::new(&config)?;
        let token_service = TokenService::new(config.jwt_secret.expose_secret());

        Ok(Self {
            db_pool,
            config,
            user_repo,
            email_service,
            token_service,
        })
    }
}
