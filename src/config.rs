use std::{env, path::PathBuf, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub media_dir: PathBuf,
    pub catalog_fetch_timeout: Duration,
    pub max_upload_bytes: usize,
    pub email: Option<EmailConfig>,
}

/// SMTP settings; absent when `SMTP_HOST` is not set.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let media_dir = env::var("MEDIA_DIR").unwrap_or_else(|_| "media".to_string());

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            jwt_secret,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 24),
            media_dir: PathBuf::from(media_dir),
            catalog_fetch_timeout: Duration::from_secs(parse_or("CATALOG_FETCH_TIMEOUT_SECS", 30)),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            email: EmailConfig::from_env(),
        })
    }
}

impl EmailConfig {
    fn from_env() -> Option<Self> {
        let smtp_host = env::var("SMTP_HOST").ok().filter(|h| !h.is_empty())?;
        Some(Self {
            smtp_host,
            smtp_port: parse_or("SMTP_PORT", 587),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_address: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "noreply@localhost".to_string()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
