//! Application configuration loaded once from environment variables.
//!
//! Required:
//! - `DATABASE_URL` - Postgres connection string
//! - `JWT_SECRET` - token signing secret
//!
//! Optional:
//! - `APP_HOST` (default 127.0.0.1), `APP_PORT` (default 3000)
//! - `DATABASE_MAX_CONNECTIONS` (default 10)
//! - `PUBLIC_BASE_URL` - externally visible URL, used in gateway callbacks
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM`
//! - `GATEWAY_BASE_URL`, `GATEWAY_APP_KEY`, `GATEWAY_APP_SECRET`
//! - `AI_API_URL`, `AI_API_KEY`, `AI_MODEL`
//! - `VAPID_PUBLIC_KEY`, `VAPID_PRIVATE_KEY`, `VAPID_SUBJECT`
//! - `IMAGE_CDN_URL`, `IMAGE_CDN_KEY`
//! - `AI_FLAGS_PATH` - JSON file for AI feature flags (default `ai-flags.json`)
//!
//! Feature sections resolve to `None` when their variables are absent, and the
//! matching endpoints answer 400 instead of failing at startup.

use std::env;

use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub public_base_url: String,
    pub jwt_secret: SecretString,
    pub smtp: Option<SmtpConfig>,
    pub gateway: Option<GatewayConfig>,
    pub ai: Option<AiConfig>,
    pub push: Option<PushConfig>,
    pub image_cdn: Option<ImageCdnConfig>,
    pub ai_flags_path: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

/// Mobile payment gateway credentials (create/execute/verify + IPN).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub app_key: String,
    pub app_secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_url: String,
    pub api_key: SecretString,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub vapid_public_key: String,
    pub vapid_private_key: SecretString,
    pub subject: String,
}

#[derive(Debug, Clone)]
pub struct ImageCdnConfig {
    pub upload_url: String,
    pub api_key: SecretString,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}"));
        let jwt_secret = SecretString::from(env::var("JWT_SECRET")?);
        let ai_flags_path =
            env::var("AI_FLAGS_PATH").unwrap_or_else(|_| "ai-flags.json".to_string());

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            public_base_url,
            jwt_secret,
            smtp: SmtpConfig::from_env(),
            gateway: GatewayConfig::from_env(),
            ai: AiConfig::from_env(),
            push: PushConfig::from_env(),
            image_cdn: ImageCdnConfig::from_env(),
            ai_flags_path,
        })
    }
}

impl SmtpConfig {
    fn from_env() -> Option<Self> {
        let host = env::var("SMTP_HOST").ok()?;
        let username = env::var("SMTP_USERNAME").ok()?;
        let password = SecretString::from(env::var("SMTP_PASSWORD").ok()?);
        let from_address = env::var("SMTP_FROM").ok()?;
        let port = env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(587);
        Some(Self {
            host,
            port,
            username,
            password,
            from_address,
        })
    }
}

impl GatewayConfig {
    fn from_env() -> Option<Self> {
        Some(Self {
            base_url: env::var("GATEWAY_BASE_URL").ok()?,
            app_key: env::var("GATEWAY_APP_KEY").ok()?,
            app_secret: SecretString::from(env::var("GATEWAY_APP_SECRET").ok()?),
        })
    }
}

impl AiConfig {
    fn from_env() -> Option<Self> {
        Some(Self {
            api_url: env::var("AI_API_URL").ok()?,
            api_key: SecretString::from(env::var("AI_API_KEY").ok()?),
            model: env::var("AI_MODEL").unwrap_or_else(|_| "claude-sonnet-4-20250514".into()),
        })
    }
}

impl PushConfig {
    fn from_env() -> Option<Self> {
        Some(Self {
            vapid_public_key: env::var("VAPID_PUBLIC_KEY").ok()?,
            vapid_private_key: SecretString::from(env::var("VAPID_PRIVATE_KEY").ok()?),
            subject: env::var("VAPID_SUBJECT").unwrap_or_else(|_| "mailto:ops@example.com".into()),
        })
    }
}

impl ImageCdnConfig {
    fn from_env() -> Option<Self> {
        Some(Self {
            upload_url: env::var("IMAGE_CDN_URL").ok()?,
            api_key: SecretString::from(env::var("IMAGE_CDN_KEY").ok()?),
        })
    }
}
