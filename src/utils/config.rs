use std::{env, net::SocketAddr, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid socket address: {value}")]
    InvalidAddr { name: &'static str, value: String },

    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub primary_schedule_url: String,
    pub secondary_schedule_url: String,
    pub secondary_api_key: Option<String>,
    pub secondary_api_host: Option<String>,
    pub tertiary_schedule_path: PathBuf,
    pub weather_url: String,
    pub news_api_url: String,
    pub news_api_key: Option<String>,
    pub news_api_host: Option<String>,
    pub ergast_url: String,
    pub cms_project_id: String,
    pub cms_dataset: String,
    pub cms_api_version: String,
    pub cms_token: Option<String>,
    pub schedule_cache_ttl_secs: i64,
    pub news_cache_ttl_secs: i64,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn init() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source; unset names take
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let optional_var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind = var_or("BIND_ADDR", "127.0.0.1:3000");
        let bind_addr = bind.parse().map_err(|_| ConfigError::InvalidAddr {
            name: "BIND_ADDR",
            value: bind.clone(),
        })?;

        Ok(Config {
            bind_addr,
            log_level: var_or("LOG_LEVEL", "info").to_lowercase(),
            primary_schedule_url: var_or("PRIMARY_SCHEDULE_URL", "http://127.0.0.1:8000"),
            secondary_schedule_url: var_or(
                "SECONDARY_SCHEDULE_URL",
                "https://f1-motorsport-data.p.rapidapi.com/schedule",
            ),
            secondary_api_key: optional_var("SECONDARY_API_KEY"),
            secondary_api_host: optional_var("SECONDARY_API_HOST"),
            tertiary_schedule_path: PathBuf::from(var_or(
                "TERTIARY_SCHEDULE_PATH",
                "static/races.json",
            )),
            weather_url: var_or("WEATHER_URL", "https://api.open-meteo.com/v1/forecast"),
            news_api_url: var_or(
                "NEWS_API_URL",
                "https://f1-motorsport-news.p.rapidapi.com/news",
            ),
            news_api_key: optional_var("NEWS_API_KEY"),
            news_api_host: optional_var("NEWS_API_HOST"),
            ergast_url: var_or("ERGAST_URL", "https://api.jolpi.ca/ergast/f1"),
            cms_project_id: var_or("CMS_PROJECT_ID", "nashfy"),
            cms_dataset: var_or("CMS_DATASET", "production"),
            cms_api_version: var_or("CMS_API_VERSION", "v2023-10-01"),
            cms_token: optional_var("CMS_TOKEN"),
            schedule_cache_ttl_secs: number_or(&lookup, "SCHEDULE_CACHE_TTL_SECS", 300)?,
            news_cache_ttl_secs: number_or(&lookup, "NEWS_CACHE_TTL_SECS", 6 * 60 * 60)?,
            http_timeout_secs: number_or(&lookup, "HTTP_TIMEOUT_SECS", 10)?,
        })
    }
}

fn number_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}
