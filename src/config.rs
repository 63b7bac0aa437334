use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_NOTCHPAY_BASE_URL: &str = "https://api.notchpay.co";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    /// Unset means the service runs against the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub notchpay_public_key: String,
    pub notchpay_hash_key: Option<String>,
    pub notchpay_base_url: String,
    pub payment_callback_url: Option<String>,
    pub payment_currency: String,
    pub attempt_ttl_hours: Option<i64>,
    pub log_format: LogFormat,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let payment_callback_url = get_env_opt("PAYMENT_CALLBACK_URL");
        if let Some(ref raw) = payment_callback_url {
            url::Url::parse(raw).map_err(|e| {
                Error::Config(format!("Invalid value for PAYMENT_CALLBACK_URL: {}", e))
            })?;
        }

        let attempt_ttl_hours = match get_env_opt("ATTEMPT_TTL_HOURS") {
            Some(_) => Some(get_env_parse::<i64>("ATTEMPT_TTL_HOURS")?),
            None => None,
        };
        if matches!(attempt_ttl_hours, Some(h) if h <= 0) {
            return Err(Error::Config(
                "ATTEMPT_TTL_HOURS must be a positive number of hours".to_string(),
            ));
        }

        let log_format = match get_env_opt("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(Error::Config(format!(
                    "Invalid value for LOG_FORMAT: {} (expected text or json)",
                    other
                )))
            }
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env_opt("DATABASE_URL"),
            jwt_secret: get_env("JWT_SECRET")?,
            notchpay_public_key: get_env("NOTCHPAY_PUBLIC_KEY")?,
            notchpay_hash_key: get_env_opt("NOTCHPAY_HASH_KEY"),
            notchpay_base_url: get_env_opt("NOTCHPAY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_NOTCHPAY_BASE_URL.to_string()),
            payment_callback_url,
            payment_currency: get_env_opt("PAYMENT_CURRENCY").unwrap_or_else(|| "XAF".to_string()),
            attempt_ttl_hours,
            log_format,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
