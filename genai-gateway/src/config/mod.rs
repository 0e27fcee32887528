use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Model used when `GENAI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub provider: ProviderKind,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub limits: LimitsConfig,
}

/// Which backend the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    /// Canned replies, no network. For local runs and tests.
    Mock,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown GENAI_PROVIDER '{}', expected 'gemini' or 'mock'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model identifier sent with every generation call (e.g. gemini-2.5-flash)
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Largest accepted request body, uploads included
    pub max_upload_bytes: usize,
    /// Transport timeout for a single backend call
    pub request_timeout_secs: u64,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let provider: ProviderKind = get_env("GENAI_PROVIDER", Some("gemini"), false)?.parse()?;

        // The key is only mandatory when a real backend is used.
        let api_key = match env::var("GOOGLE_API_KEY").or_else(|_| env::var("GEMINI_API_KEY")) {
            Ok(key) => key,
            Err(_) if provider == ProviderKind::Mock => String::new(),
            Err(_) => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "GOOGLE_API_KEY is required but not set"
                )))
            }
        };

        Ok(GatewayConfig {
            common: common_config,
            provider,
            google: GoogleConfig {
                api_key,
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_API_BASE), false)?,
            },
            models: ModelConfig {
                model: get_env("GENAI_MODEL", Some(DEFAULT_MODEL), is_prod)?,
            },
            limits: LimitsConfig {
                max_upload_bytes: parse_or_default(
                    "GENAI_MAX_UPLOAD_BYTES",
                    env::var("GENAI_MAX_UPLOAD_BYTES").ok().as_deref(),
                    DEFAULT_MAX_UPLOAD_BYTES,
                ),
                request_timeout_secs: parse_or_default(
                    "GENAI_REQUEST_TIMEOUT_SECS",
                    env::var("GENAI_REQUEST_TIMEOUT_SECS").ok().as_deref(),
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                ),
            },
        })
    }
}

/// Parse an optional numeric setting; unparsable values fall back to
/// `default` with a warning.
fn parse_or_default<T>(key: &str, raw: Option<&str>, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                key,
                value = raw,
                default = %default,
                error = %e,
                "Invalid numeric setting, using default"
            );
            default
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
