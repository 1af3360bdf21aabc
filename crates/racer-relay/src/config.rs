//! Relay configuration.

use std::net::SocketAddr;

use crate::error::RelayError;

/// Environment variable overriding the listen address.
pub const ADDR_ENV: &str = "RACER_RELAY_ADDR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    pub addr: SocketAddr,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl RelayConfig {
    /// Defaults, with `RACER_RELAY_ADDR` applied when set.
    pub fn from_env() -> Result<Self, RelayError> {
        Self::with_override(std::env::var(ADDR_ENV).ok().as_deref())
    }

    fn with_override(addr: Option<&str>) -> Result<Self, RelayError> {
        let mut config = Self::default();
        if let Some(raw) = addr {
            config.addr = raw
                .parse()
                .map_err(|_| RelayError::InvalidAddr(raw.to_string()))?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        assert_eq!(RelayConfig::default().addr.port(), 3000);
    }

    #[test]
    fn test_address_override() {
        let config = RelayConfig::with_override(Some("127.0.0.1:4100")).unwrap();
        assert_eq!(config.addr, SocketAddr::from(([127, 0, 0, 1], 4100)));
        assert!(matches!(
            RelayConfig::with_override(Some("nope")),
            Err(RelayError::InvalidAddr(_))
        ));
    }
}
