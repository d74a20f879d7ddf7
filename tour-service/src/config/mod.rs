use secrecy::{ExposeSecret, SecretString};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

const MIN_PROD_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct TourConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreBackend,
    /// Present only when `store` is `Mongo`.
    pub mongodb: Option<MongoConfig>,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub expiry_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub register_attempts: u32,
    pub register_window_seconds: u64,
}

impl TourConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        let store: StoreBackend = get_env("STORE_BACKEND", Some("mongo"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let mongodb = match store {
            StoreBackend::Mongo => Some(MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("tour_marketplace"), is_prod)?,
            }),
            StoreBackend::Memory => None,
        };

        let config = TourConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("tour-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            store,
            mongodb,
            jwt: JwtConfig {
                secret: SecretString::new(get_env("JWT_SECRET", None, is_prod)?),
                expiry_minutes: parse_env("JWT_EXPIRY_MINUTES", "1440", is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
            rate_limit: RateLimitConfig {
                login_attempts: parse_env("LOGIN_RATE_LIMIT", "5", is_prod)?,
                login_window_seconds: parse_env("LOGIN_RATE_WINDOW_SECONDS", "900", is_prod)?,
                register_attempts: parse_env("REGISTER_RATE_LIMIT", "3", is_prod)?,
                register_window_seconds: parse_env(
                    "REGISTER_RATE_WINDOW_SECONDS",
                    "3600",
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.jwt.secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must not be empty"
            )));
        }

        if self.rate_limit.login_attempts == 0 || self.rate_limit.register_attempts == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Rate limits must allow at least one attempt"
            )));
        }

        if self.environment == Environment::Prod {
            if self.jwt.secret.expose_secret().len() < MIN_PROD_SECRET_BYTES {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET must be at least {} bytes in production",
                    MIN_PROD_SECRET_BYTES
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.store == StoreBackend::Memory {
                tracing::warn!("In-memory store selected in production; data will not persist");
            }
        }

        Ok(())
    }
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

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: Environment, secret: &str) -> TourConfig {
        TourConfig {
            common: core_config::Config::default(),
            environment,
            service_name: "tour-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            store: StoreBackend::Memory,
            mongodb: None,
            jwt: JwtConfig {
                secret: SecretString::new(secret.to_string()),
                expiry_minutes: 60,
            },
            security: SecurityConfig {
                allowed_origins: vec!["https://tours.example.com".to_string()],
            },
            rate_limit: RateLimitConfig {
                login_attempts: 5,
                login_window_seconds: 900,
                register_attempts: 3,
                register_window_seconds: 3600,
            },
        }
    }

    #[test]
    fn short_secret_is_rejected_in_prod_only() {
        assert!(config(Environment::Dev, "short").validate().is_ok());
        assert!(config(Environment::Prod, "short").validate().is_err());
        assert!(config(Environment::Prod, &"k".repeat(32)).validate().is_ok());
    }

    #[test]
    fn wildcard_origin_is_rejected_in_prod() {
        let mut cfg = config(Environment::Prod, &"k".repeat(48));
        cfg.security.allowed_origins = vec!["*".to_string()];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn store_backend_parses_case_insensitively() {
        assert_eq!("Memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("mongo".parse::<StoreBackend>(), Ok(StoreBackend::Mongo));
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }
}
