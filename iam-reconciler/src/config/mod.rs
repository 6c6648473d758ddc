use iam_core::client::IdentityClientConfig;
use iam_core::config as core_config;
use iam_core::error::AppError;
use secrecy::Secret;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub identity: IdentityApiConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct IdentityApiConfig {
    pub base_url: String,
    pub access_token: Option<Secret<String>>,
    pub account_switch_key: Option<String>,
    pub connect_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl IdentityApiConfig {
    pub fn client_config(&self) -> IdentityClientConfig {
        IdentityClientConfig {
            base_url: self.base_url.clone(),
            access_token: self.access_token.clone(),
            account_switch_key: self.account_switch_key.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds),
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }
}

impl ReconcilerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = ReconcilerConfig {
            common: common_config,
            environment,
            identity: IdentityApiConfig {
                base_url: get_env("IAM_BASE_URL", None, is_prod)?,
                access_token: env::var("IAM_ACCESS_TOKEN").ok().map(Secret::new),
                account_switch_key: env::var("IAM_ACCOUNT_SWITCH_KEY")
                    .ok()
                    .filter(|k| !k.is_empty()),
                connect_timeout_seconds: parse_seconds(
                    "IAM_CONNECT_TIMEOUT_SECONDS",
                    get_env("IAM_CONNECT_TIMEOUT_SECONDS", Some("5"), false)?,
                )?,
                request_timeout_seconds: parse_seconds(
                    "IAM_REQUEST_TIMEOUT_SECONDS",
                    get_env("IAM_REQUEST_TIMEOUT_SECONDS", Some("30"), false)?,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let base_url = self.identity.base_url.trim();
        if base_url.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "IAM_BASE_URL must not be empty"
            )));
        }

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "IAM_BASE_URL must be an http(s) URL"
            )));
        }

        if self.identity.connect_timeout_seconds == 0 || self.identity.request_timeout_seconds == 0
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "IAM timeouts must be positive"
            )));
        }

        if self.environment == Environment::Prod && base_url.starts_with("http://") {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Plain HTTP identity endpoint not allowed in production"
            )));
        }

        Ok(())
    }
}

fn parse_seconds(key: &str, value: String) -> Result<u64, AppError> {
    value.parse().map_err(|e: std::num::ParseIntError| {
        AppError::ConfigError(anyhow::anyhow!("{} is not a number: {}", key, e))
    })
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
