use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    /// HMAC secret for session tokens. No default: startup fails without it.
    pub signing_key: String,
    pub token_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub refresh_grace_secs: i64,
    pub max_session_secs: i64,
}

// Keeps the signing key out of logs and panic messages.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_key", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("refresh_grace_secs", &self.refresh_grace_secs)
            .field("max_session_secs", &self.max_session_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmsConfig {
    pub code_length: usize,
    pub code_ttl_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub identity: IdentityConfig,
    pub sms: SmsConfig,
    pub cors: CorsConfig,
}

fn with_defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("environment", environment)?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8021)?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("auth.token_ttl_secs", 60 * 60 * 24 * 30)?
        .set_default("auth.refresh_ttl_secs", 60 * 60)?
        .set_default("auth.refresh_grace_secs", 60 * 60 * 24 * 7)?
        .set_default("auth.max_session_secs", 60 * 60 * 24 * 60)?
        .set_default("identity.base_url", "http://127.0.0.1:50051")?
        .set_default("identity.timeout_secs", 5)?
        .set_default("sms.code_length", 6)?
        .set_default("sms.code_ttl_secs", 300)?
        .set_default("cors.enabled", true)?
        .set_default("cors.allow_any_origin", true)?
        .set_default("cors.max_age", 3600)
}

/// Upper bound for any configured lifetime: ten years.
const MAX_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

fn check_lifetime(key: &str, value: i64, allow_zero: bool) -> Result<(), ConfigError> {
    let floor = if allow_zero { 0 } else { 1 };
    if value < floor || value > MAX_LIFETIME_SECS {
        return Err(ConfigError::Message(format!(
            "{} must be between {} and {} seconds, got {}",
            key, floor, MAX_LIFETIME_SECS, value
        )));
    }
    Ok(())
}

fn env_source() -> Environment {
    // E.g., `APP_AUTH__SIGNING_KEY=...` would set `Settings.auth.signing_key`
    Environment::with_prefix("app")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = with_defaults("development")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(env_source())
            .build()?;

        s.try_deserialize::<Settings>()?.validated()
    }

    pub fn new_for_test() -> Result<Self, ConfigError> {
        with_defaults("test")?
            .set_default("auth.signing_key", "test_secret")?
            .set_default("auth.token_ttl_secs", 3600)?
            .add_source(env_source())
            .build()?
            .try_deserialize::<Settings>()?
            .validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        check_lifetime("auth.token_ttl_secs", self.auth.token_ttl_secs, false)?;
        check_lifetime("auth.refresh_ttl_secs", self.auth.refresh_ttl_secs, false)?;
        check_lifetime("auth.refresh_grace_secs", self.auth.refresh_grace_secs, true)?;
        check_lifetime("auth.max_session_secs", self.auth.max_session_secs, false)?;
        check_lifetime("sms.code_ttl_secs", self.sms.code_ttl_secs, false)?;
        Ok(self)
    }
}
