//! Session configuration loaded from TOML.
//!
//! Every connection and identity key is required. A session built from a
//! configuration that misses one stays disabled for its whole lifetime.

use std::fs;
use std::path::Path;
use std::time::Duration;

use frn_protocol::LoginInfo;
use serde::Deserialize;

use crate::error::ConfigError;

/// Default keep-alive ping period in milliseconds.
pub const DEFAULT_KEEP_ALIVE_MS: u64 = 1000;

/// Default inactivity watchdog period in milliseconds.
pub const DEFAULT_CON_TIMEOUT_MS: u64 = 30_000;

/// Default number of consecutive connection failures tolerated.
pub const DEFAULT_MAX_CONNECT_RETRY: u32 = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QsoConfig {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub email_address: Option<String>,
    pub dyn_password: Option<String>,
    pub callsign_and_user: Option<String>,
    pub client_type: Option<String>,
    pub band_and_channel: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub city_city_part: Option<String>,
    pub net: Option<String>,
    pub version: Option<String>,

    #[serde(default)]
    pub timing: Timing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub keep_alive_ms: u64,
    pub con_timeout_ms: u64,
    pub max_connect_retry: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            keep_alive_ms: DEFAULT_KEEP_ALIVE_MS,
            con_timeout_ms: DEFAULT_CON_TIMEOUT_MS,
            max_connect_retry: DEFAULT_MAX_CONNECT_RETRY,
        }
    }
}

impl Timing {
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }

    #[must_use]
    pub fn con_timeout(&self) -> Duration {
        Duration::from_millis(self.con_timeout_ms)
    }
}

/// Validated, immutable connection identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub server: String,
    pub port: u16,
    pub login: LoginInfo,
}

fn required<T: Clone>(value: Option<&T>, key: &'static str) -> Result<T, ConfigError> {
    value.cloned().ok_or(ConfigError::MissingField(key))
}

impl QsoConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Check required keys in order and report the first one missing, then
    /// reject timer periods of zero.
    pub fn validate(&self) -> Result<Credentials, ConfigError> {
        let server = required(self.server.as_ref(), "SERVER")?;
        let port = required(self.port.as_ref(), "PORT")?;
        let email_address = required(self.email_address.as_ref(), "EMAIL_ADDRESS")?;
        let dyn_password = required(self.dyn_password.as_ref(), "DYN_PASSWORD")?;
        let callsign_and_user = required(self.callsign_and_user.as_ref(), "CALLSIGN_AND_USER")?;
        let client_type = required(self.client_type.as_ref(), "CLIENT_TYPE")?;
        let band_and_channel = required(self.band_and_channel.as_ref(), "BAND_AND_CHANNEL")?;
        let description = required(self.description.as_ref(), "DESCRIPTION")?;
        let country = required(self.country.as_ref(), "COUNTRY")?;
        let city_city_part = required(self.city_city_part.as_ref(), "CITY_CITY_PART")?;
        let net = required(self.net.as_ref(), "NET")?;
        let version = required(self.version.as_ref(), "VERSION")?;

        if self.timing.keep_alive_ms == 0 {
            return Err(ConfigError::ZeroPeriod("KEEP_ALIVE_MS"));
        }
        if self.timing.con_timeout_ms == 0 {
            return Err(ConfigError::ZeroPeriod("CON_TIMEOUT_MS"));
        }

        Ok(Credentials {
            server,
            port,
            login: LoginInfo {
                version,
                email_address,
                dyn_password,
                callsign_and_user,
                client_type,
                band_and_channel,
                description,
                country,
                city_city_part,
                net,
            },
        })
    }
}
