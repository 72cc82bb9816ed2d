// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

/// Which store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Redis connection URL
    pub redis_url: String,
    pub store_backend: StoreBackend,
    /// Origins allowed by the CORS layer
    pub allowed_origins: Vec<String>,
    /// bcrypt work factor for password hashes
    pub bcrypt_cost: u32,
    /// Upper bound on token regeneration after collisions
    pub token_max_attempts: u32,
    /// Expose `POST /simulate`
    pub enable_simulation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 9090,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            store_backend: StoreBackend::Redis,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            bcrypt_cost: bcrypt::DEFAULT_COST,
            token_max_attempts: 16,
            enable_simulation: false,
        }
    }
}

impl Config {
    /// Config for tests: in-memory store, cheapest bcrypt cost, simulation on.
    pub fn test_default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            bcrypt_cost: 4,
            enable_simulation: true,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "redis".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "redis" => StoreBackend::Redis,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let bcrypt_cost = parse_var("BCRYPT_COST", defaults.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let token_max_attempts = parse_var("TOKEN_MAX_ATTEMPTS", defaults.token_max_attempts)?;
        if token_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "TOKEN_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            port: parse_var("PORT", defaults.port)?,
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            store_backend,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.allowed_origins),
            bcrypt_cost,
            token_max_attempts,
            enable_simulation: parse_var("ENABLE_SIMULATION", defaults.enable_simulation)?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
