use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::{collections::HashMap, env, str::FromStr};
use thiserror::Error;

// ============================================================================
// CONFIGURATION - Loaded once at startup, read-only afterwards
// ============================================================================

const DEFAULT_ALGORITHM: &str = "HS256";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 20;
const DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE: u32 = 10;
const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 1024;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("unsupported signing algorithm {0}, expected HS256, HS384 or HS512")]
    UnsupportedAlgorithm(String),
}

/// Token signing settings shared by everything that issues or checks tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub login_attempts_per_minute: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub auth: AuthConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first if a
    /// `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let secret = vars
            .get("AUTH_SECRET_KEY")
            .filter(|s| !s.is_empty())
            .cloned()
            .ok_or(ConfigError::Missing("AUTH_SECRET_KEY"))?;

        let algorithm_name = vars
            .get("AUTH_ALGORITHM")
            .map(String::as_str)
            .unwrap_or(DEFAULT_ALGORITHM);
        let algorithm = parse_hmac_algorithm(algorithm_name)?;

        let ttl_minutes: i64 = parse_or(&vars, "TOKEN_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES)?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_MINUTES",
                value: ttl_minutes.to_string(),
            });
        }

        let bcrypt_cost: u32 = parse_or(&vars, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let login_attempts_per_minute: u32 = parse_or(
            &vars,
            "LOGIN_ATTEMPTS_PER_MINUTE",
            DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE,
        )?;
        if login_attempts_per_minute == 0 {
            return Err(ConfigError::Invalid {
                key: "LOGIN_ATTEMPTS_PER_MINUTE",
                value: "0".into(),
            });
        }

        let max_concurrent_requests: usize = parse_or(
            &vars,
            "MAX_CONCURRENT_REQUESTS",
            DEFAULT_MAX_CONCURRENT_REQUESTS,
        )?;

        let bind_addr = vars
            .get("BIND_ADDR")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            auth: AuthConfig {
                secret,
                algorithm,
                token_ttl: Duration::minutes(ttl_minutes),
                bcrypt_cost,
                login_attempts_per_minute,
            },
            server: ServerConfig {
                bind_addr,
                max_concurrent_requests,
            },
        })
    }
}

/// Only shared-secret algorithms make sense with a single secret key.
fn parse_hmac_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(name) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}

fn parse_or<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value: raw.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_vars(vars(&[("AUTH_SECRET_KEY", "s3cret")])).unwrap();

        assert_eq!(config.auth.algorithm, Algorithm::HS256);
        assert_eq!(config.auth.token_ttl, Duration::minutes(20));
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.auth.login_attempts_per_minute, 10);
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn requires_secret() {
        let err = Config::from_vars(vars(&[("AUTH_SECRET_KEY", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AUTH_SECRET_KEY")));
    }

    #[test]
    fn rejects_asymmetric_algorithms() {
        let err = Config::from_vars(vars(&[
            ("AUTH_SECRET_KEY", "s3cret"),
            ("AUTH_ALGORITHM", "RS256"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn parses_overrides() {
        let config = Config::from_vars(vars(&[
            ("AUTH_SECRET_KEY", "s3cret"),
            ("AUTH_ALGORITHM", "HS512"),
            ("TOKEN_TTL_MINUTES", "5"),
            ("BCRYPT_COST", "4"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();

        assert_eq!(config.auth.algorithm, Algorithm::HS512);
        assert_eq!(config.auth.token_ttl, Duration::minutes(5));
        assert_eq!(config.auth.bcrypt_cost, 4);
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn rejects_garbage_numbers() {
        let err = Config::from_vars(vars(&[
            ("AUTH_SECRET_KEY", "s3cret"),
            ("TOKEN_TTL_MINUTES", "twenty"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "TOKEN_TTL_MINUTES",
                ..
            }
        ));
    }
}
