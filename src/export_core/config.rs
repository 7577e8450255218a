use crate::export_core::address::{validate_address, validate_signature, AddressError};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.helius.xyz";
pub const DEFAULT_OUTPUT: &str = "transactions.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

/// Per-run settings, taken from the command line
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub address: String,
    pub output_path: PathBuf,
    pub format: OutputFormat,
    /// Start paginating before this signature
    pub before: Option<String>,
    /// Stop once this signature is reached
    pub until: Option<String>,
}

/// Process-wide settings, taken from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub api_key: String,
    pub api_url: String,
    pub request_timeout: Duration,
    /// HTTP attempts per page, the first request included
    pub max_attempts: u32,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
    pub page_delay: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not found in environment or .env file")]
    MissingVariable(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
    #[error(transparent)]
    Address(#[from] AddressError),
}

fn parse_or<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Invalid {} '{}', using default", key, raw);
                default
            }
        },
        None => default,
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("HELIUS_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingVariable("HELIUS_API_KEY".to_string()))?;

        let api_url = lookup("HELIUS_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "HELIUS_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let request_timeout = Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64));
        let max_attempts = parse_or(&lookup, "MAX_ATTEMPTS", 5u32).max(1);
        let backoff_initial = Duration::from_millis(parse_or(&lookup, "BACKOFF_INITIAL_MS", 1_000u64));
        let backoff_max = Duration::from_millis(parse_or(&lookup, "BACKOFF_MAX_MS", 60_000u64));
        let page_delay = Duration::from_millis(parse_or(&lookup, "PAGE_DELAY_MS", 100u64));

        Ok(Self {
            api_key,
            api_url,
            request_timeout,
            max_attempts,
            backoff_initial,
            backoff_max,
            page_delay,
        })
    }
}

impl ExportConfig {
    /// Checked before any network call
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_address(&self.address)?;

        if let Some(before) = &self.before {
            validate_signature(before)?;
        }
        if let Some(until) = &self.until {
            validate_signature(until)?;
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("output path cannot be empty".to_string()));
        }

        Ok(())
    }
}
