//! Relay configuration.
//!
//! Every field has a default, so the relay runs without any file. A TOML file
//! may override any subset:
//!
//! ```toml
//! [osc]
//! bind_addr = "0.0.0.0:10000"
//!
//! [http]
//! bind_addr = "0.0.0.0:3000"
//! broadcast_capacity = 1024
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

/// UDP port OSC senders target by default.
pub const DEFAULT_OSC_PORT: u16 = 10000;
/// TCP port browsers connect to by default.
pub const DEFAULT_HTTP_PORT: u16 = 3000;
/// Events a single client may fall behind before it starts missing them.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 1024;

const ANY_INTERFACE: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// OSC (UDP) side
    pub osc: OscSettings,
    /// Browser (HTTP/WebSocket) side
    pub http: HttpSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscSettings {
    pub bind_addr: SocketAddr,
}

impl Default for OscSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(ANY_INTERFACE, DEFAULT_OSC_PORT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub bind_addr: SocketAddr,
    /// Per-client queue length of the broadcast channel
    pub broadcast_capacity: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(ANY_INTERFACE, DEFAULT_HTTP_PORT),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!("Config file not found at {:?}", path)));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RelayConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the relay cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.http.broadcast_capacity == 0 {
            return Err(Error::Config(
                "http.broadcast_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
