use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    /// Expected `aud` claim; not checked when unset
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    #[serde(default = "default_email_api_base")]
    pub api_base: String,
    /// Without a key, emails are logged instead of sent
    pub api_key: Option<String>,
    #[serde(default = "default_email_from")]
    pub from: String,
    #[serde(default = "default_site_url")]
    pub site_url: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            api_base: default_email_api_base(),
            api_key: None,
            from: default_email_from(),
            site_url: default_site_url(),
        }
    }
}

fn default_email_api_base() -> String { "https://api.resend.com".to_string() }
fn default_email_from() -> String { "HouseRater <onboarding@resend.dev>".to_string() }
fn default_site_url() -> String { "http://localhost:3000".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. config/default.toml
    /// 2. config/local.toml (development overrides)
    /// 3. HOUSERATER__* environment variables, e.g. HOUSERATER__SERVER__PORT -> server.port
    /// 4. Well-known variables such as DATABASE_URL and RESEND_API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("HOUSERATER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("HOUSERATER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Variables the hosting platform sets without our prefix
const ENV_OVERRIDES: [(&str, &str); 5] = [
    ("DATABASE_URL", "database.url"),
    ("SUPABASE_JWT_SECRET", "auth.jwt_secret"),
    ("RESEND_API_KEY", "email.api_key"),
    ("EMAIL_FROM", "email.from"),
    ("SITE_URL", "email.site_url"),
];

fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in ENV_OVERRIDES {
        if let Ok(value) = std::env::var(var) {
            if !value.trim().is_empty() {
                builder = builder.set_override(key, value)?;
            }
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_email_settings() {
        let email = EmailSettings::default();
        assert_eq!(email.api_base, "https://api.resend.com");
        assert!(email.api_key.is_none());
        assert_eq!(email.site_url, "http://localhost:3000");
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("houserater-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
url = "postgres://localhost/test"

[auth]
jwt_secret = "secret"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 9000);
        assert!(settings.auth.audience.is_none());
        assert_eq!(settings.email.from, "HouseRater <onboarding@resend.dev>");
        assert_eq!(settings.logging.format, "json");
    }
}
