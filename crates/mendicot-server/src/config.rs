//! Server configuration from the environment.

use mendicot_core::GameOptions;
use std::net::{AddrParseError, SocketAddr};
use std::num::ParseIntError;
use thiserror::Error;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SERVER_ADDR {value:?} is not a socket address: {source}")]
    InvalidAddr {
        value: String,
        source: AddrParseError,
    },

    #[error("{var} {value:?} is not a boolean")]
    InvalidBool { var: &'static str, value: String },

    #[error("MENDICOT_SEED {value:?} is not a u64: {source}")]
    InvalidSeed {
        value: String,
        source: ParseIntError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `SERVER_ADDR`
    pub addr: SocketAddr,
    /// `RUST_LOG`
    pub log_filter: String,
    /// `MENDICOT_FOLLOW_SUIT`
    pub game: GameOptions,
    /// `MENDICOT_SEED`; each session derives its own seed from it
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            game: GameOptions::default(),
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_value = lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_value
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::InvalidAddr {
                value: addr_value.clone(),
                source,
            })?;

        let log_filter = lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let follow_suit = match lookup("MENDICOT_FOLLOW_SUIT") {
            Some(value) => parse_bool("MENDICOT_FOLLOW_SUIT", value)?,
            None => GameOptions::default().follow_suit,
        };

        let seed = lookup("MENDICOT_SEED")
            .map(|value| {
                value
                    .parse::<u64>()
                    .map_err(|source| ConfigError::InvalidSeed { value, source })
            })
            .transpose()?;

        Ok(Self {
            addr,
            log_filter,
            game: GameOptions { follow_suit },
            seed,
        })
    }
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { var, value }),
    }
}
