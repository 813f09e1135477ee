use secrecy::SecretBox;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,
    /// トークン署名用シークレット
    pub jwt_secret: SecretBox<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // SMTP設定（未設定なら開発モード: メールはログ出力のみ）
    #[serde(default)]
    pub email_host: Option<String>,
    #[serde(default = "default_email_port")]
    pub email_port: u16,
    pub email_user: Option<SecretBox<String>>,
    pub email_pass: Option<SecretBox<String>>,
    /// 送信元アドレス（表示名付き）
    #[serde(default = "default_email_from")]
    pub email_from: String,

    /// 環境名（起動ログに出すだけ）
    #[serde(default = "default_environment")]
    pub environment: String,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_EMAIL_PORT: u16 = 587;
const DEFAULT_EMAIL_FROM: &str = "\"Clementine Solutions\" <develop@clementine-solutions.com>";
const DEFAULT_ENVIRONMENT: &str = "development";

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_email_port() -> u16 {
    DEFAULT_EMAIL_PORT
}

fn default_email_from() -> String {
    DEFAULT_EMAIL_FROM.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
