use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

use crate::config::Config;
use crate::error::AppError;

/// メール送信サービス
///
/// SMTP ホスト未設定時は開発モード: 送信せずログ出力のみで成功扱い。
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let from: Mailbox = config
            .email_from
            .parse()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid EMAIL_FROM address: {e}")))?;

        let mailer = match &config.email_host {
            Some(host) => {
                // 旧実装と同じく STARTTLS（secure: false + port 587）
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
                    .port(config.email_port);
                if let (Some(user), Some(pass)) = (&config.email_user, &config.email_pass) {
                    builder = builder.credentials(Credentials::new(
                        user.expose_secret().clone(),
                        pass.expose_secret().clone(),
                    ));
                }
                Some(builder.build())
            }
            None => {
                tracing::info!("SMTP 未設定（開発モード: メールはログ出力のみ）");
                None
            }
        };

        Ok(Self { mailer, from })
    }

    /// ワンタイムコードを指定アドレスへ送信
    ///
    /// # Security
    /// コード本体はログに出力しない
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let Some(mailer) = &self.mailer else {
            tracing::info!(to = %to, subject = %subject, "メール送信（開発モード）");
            return Ok(());
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid recipient address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build message: {e}")))?;

        mailer.send(message).await?;

        tracing::info!(to = %to, subject = %subject, "メール送信完了");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_mode_service() -> EmailService {
        EmailService {
            mailer: None,
            from: "\"Clementine Solutions\" <develop@clementine-solutions.com>"
                .parse()
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_dev_mode_send_succeeds() {
        let service = dev_mode_service();
        let result = service
            .send("jane@x.com", "✔ Verify Your Email", "ABCDEFG2")
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_default_from_address_parses() {
        // 設定デフォルトの表示名付きアドレスが Mailbox として妥当なこと
        let parsed = "\"Clementine Solutions\" <develop@clementine-solutions.com>"
            .parse::<Mailbox>();
        assert!(parsed.is_ok());
    }
}
