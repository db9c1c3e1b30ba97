use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;
use tokio::time::Instant;

const ENV_PREFIX: &str = "PRICESYNC_";

const DEFAULT_DB_PATH: &str = "./db/prices.db";
const DEFAULT_STOCK_SYMBOLS: &str = "AAPL,GOOGL,MSFT";
const DEFAULT_VS_CURRENCY: &str = "usd";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PACING_MS: u64 = 1000;
const DEFAULT_CYCLE_DEADLINE_SECS: u64 = 300;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;
const MAX_PACING_MS: u64 = 60_000;
/// One day.
const MAX_CYCLE_DEADLINE_SECS: u64 = 86_400;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: String, value: String },

    #[error("{var} must be between {min} and {max}, got {value}")]
    OutOfRange { var: String, value: u64, min: u64, max: u64 },

    #[error("{var} must be true or false, got '{value}'")]
    InvalidBool { var: String, value: String },

    #[error("unknown timezone '{0}' in PRICESYNC_MARKET_TZ")]
    InvalidTimezone(String),

    #[error("unknown log format '{0}', expected text or json")]
    InvalidLogFormat(String),

    #[error("no symbols configured for any source")]
    EmptyUniverse,

    #[error("cycle deadline of {0:?} cannot be scheduled")]
    DeadlineUnschedulable(Duration),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub db_path: String,
    /// Quote API symbols stored as stock prices.
    pub stock_symbols: Vec<String>,
    /// Quote API symbols stored as crypto prices (e.g. BTC-USD).
    pub crypto_quote_symbols: Vec<String>,
    pub coingecko_ids: Vec<String>,
    /// Chart scraper symbols, stored as stock prices.
    pub chart_symbols: Vec<String>,
    pub vs_currency: String,
    pub coingecko_api_key: Option<String>,
    pub market_tz: Tz,
    pub request_timeout: Duration,
    pub pacing: Duration,
    pub cycle_deadline: Duration,
    pub concurrent_sources: bool,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. The lookup receives full
    /// variable names such as `PRICESYNC_DB_PATH`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        let list = |name: &str, default: &str| -> Vec<String> {
            split_list(var(name).as_deref().unwrap_or(default))
        };

        let number = |name: &str, default: u64, min: u64, max: u64| -> Result<u64, ConfigError> {
            let value = match var(name) {
                None => default,
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                    var: format!("{}{}", ENV_PREFIX, name),
                    value: raw.clone(),
                })?,
            };
            if !(min..=max).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    var: format!("{}{}", ENV_PREFIX, name),
                    value,
                    min,
                    max,
                });
            }
            Ok(value)
        };

        let market_tz = match var("MARKET_TZ") {
            None => Tz::UTC,
            Some(raw) => Tz::from_str(raw.trim()).map_err(|_| ConfigError::InvalidTimezone(raw))?,
        };

        let concurrent_sources = match var("CONCURRENT_SOURCES") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidBool {
                var: format!("{}CONCURRENT_SOURCES", ENV_PREFIX),
                value: raw,
            })?,
        };

        let log_format = match var("LOG_FORMAT") {
            None => LogFormat::Text,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "text" | "" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => return Err(ConfigError::InvalidLogFormat(raw)),
            },
        };

        Ok(Self {
            db_path: var("DB_PATH")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            stock_symbols: list("STOCK_SYMBOLS", DEFAULT_STOCK_SYMBOLS),
            crypto_quote_symbols: list("CRYPTO_QUOTE_SYMBOLS", ""),
            coingecko_ids: list("COINGECKO_IDS", ""),
            chart_symbols: list("CHART_SYMBOLS", ""),
            vs_currency: var("VS_CURRENCY")
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_VS_CURRENCY.to_string()),
            coingecko_api_key: var("COINGECKO_API_KEY")
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            market_tz,
            request_timeout: Duration::from_secs(number(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
                1,
                MAX_REQUEST_TIMEOUT_SECS,
            )?),
            pacing: Duration::from_millis(number("PACING_MS", DEFAULT_PACING_MS, 0, MAX_PACING_MS)?),
            cycle_deadline: Duration::from_secs(number(
                "CYCLE_DEADLINE_SECS",
                DEFAULT_CYCLE_DEADLINE_SECS,
                1,
                MAX_CYCLE_DEADLINE_SECS,
            )?),
            concurrent_sources,
            log_format,
        })
    }

    pub fn symbol_count(&self) -> usize {
        self.stock_symbols.len()
            + self.crypto_quote_symbols.len()
            + self.coingecko_ids.len()
            + self.chart_symbols.len()
    }

    /// Instant at which a cycle started at `now` stops issuing requests.
    pub fn deadline_from(&self, now: Instant) -> Result<Instant, ConfigError> {
        now.checked_add(self.cycle_deadline)
            .ok_or(ConfigError::DeadlineUnschedulable(self.cycle_deadline))
    }

    /// An ingestion run needs at least one symbol.
    pub fn ensure_universe(&self) -> Result<(), ConfigError> {
        if self.symbol_count() == 0 {
            return Err(ConfigError::EmptyUniverse);
        }
        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
