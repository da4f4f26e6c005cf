//! Start-up configuration, read once from the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use explorer_core::DEFAULT_HISTORY_CAP;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub history_cap: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT` and `HISTORY_CAP`; unset variables keep their
    /// defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = match lookup("HOST") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "HOST",
                expected: "an IP address",
                value,
            })?,
            None => defaults.host,
        };

        let port = match lookup("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "a port number",
                value,
            })?,
            None => defaults.port,
        };

        let history_cap = match lookup("HISTORY_CAP") {
            Some(value) => match value.parse::<usize>() {
                Ok(cap) if cap > 0 => cap,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "HISTORY_CAP",
                        expected: "a positive integer",
                        value,
                    })
                }
            },
            None => defaults.history_cap,
        };

        Ok(Self {
            host,
            port,
            history_cap,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
