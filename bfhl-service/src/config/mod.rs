use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Default upper bound on a single provider call.
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BfhlConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    /// Identity echoed in every envelope.
    #[validate(email)]
    pub official_email: String,
    #[validate(nested)]
    pub genai: GenaiConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenaiConfig {
    pub provider: ProviderKind,
    /// Required when `provider` is Gemini.
    pub api_key: Option<Secret<String>>,
    #[validate(length(min = 1))]
    pub text_model: String,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl GenaiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which text-generation backend answers `AI` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown GENAI_PROVIDER '{}' (expected 'gemini' or 'mock')",
                other
            ))),
        }
    }
}

impl BfhlConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let provider: ProviderKind = get_env("GENAI_PROVIDER", Some("gemini"), is_prod)?.parse()?;
        let api_key = match provider {
            ProviderKind::Gemini => Some(Secret::new(get_env("GEMINI_API_KEY", None, is_prod)?)),
            ProviderKind::Mock => env::var("GEMINI_API_KEY").ok().map(Secret::new),
        };

        let config = BfhlConfig {
            common: common_config,
            official_email: get_env("OFFICIAL_EMAIL", Some("bfhl@example.com"), is_prod)?,
            genai: GenaiConfig {
                provider,
                api_key,
                text_model: get_env("GENAI_TEXT_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                timeout_secs: get_env(
                    "GENAI_TIMEOUT_SECS",
                    Some(&DEFAULT_PROVIDER_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
            },
        };

        config
            .validate()
            .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

        Ok(config)
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
