use std::{env, num::ParseIntError};

use thiserror::Error;

/// Host running carbon's plaintext listener. Unset or empty means "don't send".
pub const CARBON_HOST_ENV: &str = "CARBON_HOST";
pub const CARBON_PORT_ENV: &str = "CARBON_PORT";
pub const DEFAULT_PORT: u16 = 2003;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("CARBON_PORT must be a port number, was: {value:?}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Where metrics go. A `None` host is debug mode: lines are logged, never sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub host: Option<String>,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self::debug()
    }
}

impl Config {
    pub fn debug() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
        }
    }
    pub fn with_host<S: Into<String>>(host: S) -> Self {
        Self {
            host: Some(host.into()),
            port: DEFAULT_PORT,
        }
    }
    pub fn with_port(self, port: u16) -> Self {
        Self { port, ..self }
    }
    pub fn is_debug(&self) -> bool {
        self.host.is_none()
    }
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }
    /// The port is only parsed once a host is present, debug mode never fails.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match lookup(CARBON_HOST_ENV) {
            Some(host) if !host.trim().is_empty() => host.trim().to_string(),
            _ => return Ok(Self::debug()),
        };
        let port = match lookup(CARBON_PORT_ENV) {
            Some(port) if !port.trim().is_empty() => {
                port.trim()
                    .parse::<u16>()
                    .map_err(|source| ConfigError::InvalidPort {
                        value: port.clone(),
                        source,
                    })?
            }
            _ => DEFAULT_PORT,
        };
        Ok(Self {
            host: Some(host),
            port,
        })
    }
}

/// Resolved on every emission so changes to the destination take effect
/// without rebuilding the client.
pub trait ConfigSource {
    fn resolve(&self) -> Result<Config, ConfigError>;
}

/// Reads [CARBON_HOST_ENV] and [CARBON_PORT_ENV] from the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvConfig;

impl ConfigSource for EnvConfig {
    fn resolve(&self) -> Result<Config, ConfigError> {
        Config::from_env()
    }
}

impl ConfigSource for Config {
    fn resolve(&self) -> Result<Config, ConfigError> {
        Ok(self.clone())
    }
}
