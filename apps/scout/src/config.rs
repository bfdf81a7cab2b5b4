use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

const DEFAULT_OLLAMA_HOST: &str = "https://ollama.com";
const DEFAULT_INTERVAL_SECS: u64 = 60;
const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Application configuration loaded from environment variables.
/// Fails at startup if either backend secret is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub ollama_api_key: String,
    pub google_api_key: String,
    pub ollama_host: String,
    pub interval: Duration,
    pub max_in_flight: usize,
    pub output_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            ollama_api_key: require_secret(&lookup, "OLLAMA_API_KEY")?,
            google_api_key: require_secret(&lookup, "GOOGLE_API_KEY")?,
            ollama_host: lookup("OLLAMA_HOST")
                .and_then(|h| normalize_host(&h))
                .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string()),
            interval: Duration::from_secs(parse_positive(
                &lookup,
                "SCOUT_INTERVAL_SECS",
                DEFAULT_INTERVAL_SECS,
            )?),
            max_in_flight: parse_positive(&lookup, "SCOUT_MAX_IN_FLIGHT", DEFAULT_MAX_IN_FLIGHT)?,
            output_dir: lookup("SCOUT_OUTPUT_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Accepts the Ollama CLI's `host:port` form by defaulting the scheme to http.
fn normalize_host(raw: &str) -> Option<String> {
    let host = raw.trim().trim_end_matches('/');
    if host.is_empty() {
        return None;
    }
    if host.contains("://") {
        Some(host.to_string())
    } else {
        Some(format!("http://{host}"))
    }
}

fn require_secret<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::MissingEnv(key.to_string()))
}

fn parse_positive<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let value = raw.trim().parse::<T>().map_err(|_| AppError::InvalidEnv {
        key: key.to_string(),
        message: format!("'{raw}' is not a valid number"),
    })?;
    if value <= T::default() {
        return Err(AppError::InvalidEnv {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
